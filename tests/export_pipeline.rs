//! Export runs into a local lake.

use std::sync::Arc;

use chrono::NaiveDate;
use datalake::diagnostics::MemorySink;
use datalake::error::Result;
use datalake::models::{GitHubConfig, Question, StackOverflowConfig};
use datalake::pipeline::{export_questions, export_repositories};
use datalake::search::SearchOutcome;
use datalake::services::{RepositorySearchClient, TaggedQuestionScraper};
use datalake::storage::{AttributeStore, Datalake, FixedClock, LocalFileSystem};
use datalake::utils::http::{Request, Transport};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Answers GitHub searches with three repositories and Stack Overflow with
/// one listing page.
struct Canned;

impl Transport for Canned {
    fn get(&self, request: &Request) -> Result<String> {
        if request.url.ends_with("/search/repositories") {
            return Ok(json!({
                "total_count": 3,
                "items": [
                    {"id": 10, "full_name": "a/one", "language": "Rust"},
                    {"id": 20, "full_name": "b/two", "language": null},
                    {"id": 30, "full_name": "c/three", "language": "Rust"}
                ]
            })
            .to_string());
        }
        Ok(r#"<html><body>
              <div class="summary">
                <a href="/questions/42/answer" class="question-hyperlink">The answer</a>
                <div class="tags"><a rel="tag">rust</a><a rel="tag">hdfs</a></div>
              </div>
            </body></html>"#
            .to_string())
    }
}

fn lake(tmp: &TempDir, source: &str, kind: &str) -> Datalake {
    let fs = Arc::new(LocalFileSystem::new(tmp.path()));
    Datalake::new(
        "raw",
        source,
        kind,
        &FixedClock(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()),
        fs.clone(),
        AttributeStore::new(fs),
    )
}

fn github() -> RepositorySearchClient {
    RepositorySearchClient::new(Arc::new(Canned), &GitHubConfig::default(), None, MemorySink::new())
}

#[test]
fn repositories_are_stored_with_attributes() {
    let tmp = TempDir::new().unwrap();
    let lake = lake(&tmp, "github", "repositories");
    let client = github();

    let summary = export_repositories(&client, &lake, &client.query("language:rust"), None).unwrap();
    assert_eq!(summary.stored, 3);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.outcome, SearchOutcome::Exhausted);

    let paths: Vec<String> = lake.list(None, false).map(|l| l.unwrap().path).collect();
    assert_eq!(
        paths,
        vec![
            "/raw/github/repositories/2024/03/07/10.json",
            "/raw/github/repositories/2024/03/07/20.json",
            "/raw/github/repositories/2024/03/07/30.json",
        ]
    );

    let body: Value = lake.get_json("2024/03/07/10.json").unwrap();
    assert_eq!(body["full_name"], "a/one");

    let attrs = lake
        .attributes()
        .get_attributes(&paths[0], &["language", "query"])
        .unwrap();
    assert_eq!(attrs["language"], "Rust");
    assert_eq!(attrs["query"], "language:rust");

    let attrs = lake.attributes().get_attributes(&paths[1], &[]).unwrap();
    assert!(!attrs.contains_key("language"));
}

#[test]
fn limit_stops_the_search() {
    let tmp = TempDir::new().unwrap();
    let lake = lake(&tmp, "github", "repositories");
    let client = github();

    let summary = export_repositories(&client, &lake, &client.query("q"), Some(2)).unwrap();
    assert_eq!(summary.stored, 2);
    assert_eq!(summary.outcome, SearchOutcome::Stopped);
    assert_eq!(lake.list(None, false).count(), 2);
}

#[test]
fn questions_are_stored_by_qid() {
    let tmp = TempDir::new().unwrap();
    let lake = lake(&tmp, "stackoverflow", "questions");
    let scraper =
        TaggedQuestionScraper::new(Arc::new(Canned), &StackOverflowConfig::default(), MemorySink::new())
            .unwrap();

    let summary = export_questions(&scraper, &lake, "rust", None).unwrap();
    assert_eq!(summary.stored, 1);

    let question: Question = lake.get_json("/raw/stackoverflow/questions/2024/03/07/42.json").unwrap();
    assert_eq!(question.title, "The answer");
    assert_eq!(question.tags, vec!["rust", "hdfs"]);

    let listed: Vec<_> = lake.list(Some("2024/03/07"), true).collect::<Result<_>>().unwrap();
    let attrs = listed[0].attributes.as_ref().unwrap();
    assert_eq!(attrs["tags"], "rust,hdfs");
    assert_eq!(attrs["title"], "The answer");
}
