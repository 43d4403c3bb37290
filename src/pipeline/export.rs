// src/pipeline/export.rs

//! Search-and-store runs.
//!
//! Each run drives one source client and writes every accepted record into
//! a [`Datalake`], tagged with a few searchable attributes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Question, SearchQuery};
use crate::search::{Flow, SearchOutcome, SearchSummary};
use crate::services::{LANGUAGES, RepositorySearchClient, TaggedQuestionScraper};
use crate::storage::Datalake;
use crate::utils::log;

/// What an export run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Records written
    pub stored: usize,
    /// Pages fetched
    pub pages: u32,
    pub outcome: SearchOutcome,
}

impl ExportSummary {
    fn new(stored: usize, search: SearchSummary) -> Self {
        Self {
            stored,
            pages: search.pages,
            outcome: search.outcome,
        }
    }

    pub fn log(&self, title: &str) {
        log::summary(
            title,
            &[
                ("stored", self.stored.to_string()),
                ("pages", self.pages.to_string()),
                ("outcome", self.outcome.to_string()),
            ],
        );
    }
}

/// Store-or-stop bookkeeping shared by both exports.
struct Budget {
    stored: usize,
    limit: Option<usize>,
}

impl Budget {
    fn new(limit: Option<usize>) -> Self {
        Self { stored: 0, limit }
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.stored >= limit)
    }

    /// Run `store` unless the limit is already met; stop once it is.
    fn admit(&mut self, store: impl FnOnce() -> Result<()>) -> Result<Flow> {
        if self.exhausted() {
            return Ok(Flow::Stop);
        }
        store()?;
        self.stored += 1;
        Ok(Flow::from(!self.exhausted()))
    }
}

/// Attributes stored alongside a repository.
pub fn repository_attributes(repo: &Value, query: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    for key in ["full_name", "language"] {
        if let Some(value) = repo.get(key).and_then(Value::as_str) {
            attrs.insert(key.to_string(), value.to_string());
        }
    }
    attrs.insert("query".to_string(), query.to_string());
    attrs
}

/// Attributes stored alongside a question.
pub fn question_attributes(question: &Question) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("title".to_string(), question.title.clone()),
        ("tags".to_string(), question.joined_tags()),
    ])
}

/// Search repositories and store each one as `{id}.json`.
pub fn export_repositories(
    client: &RepositorySearchClient,
    lake: &Datalake,
    query: &SearchQuery,
    limit: Option<usize>,
) -> Result<ExportSummary> {
    let mut budget = Budget::new(limit);

    let search = client.search_repositories(query, |repo| {
        budget.admit(|| {
            let id = repo
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| AppError::decode("repository without a numeric id"))?;
            lake.store_json(&id.to_string(), repo, &repository_attributes(repo, &query.text))?;
            Ok(())
        })
    })?;

    Ok(ExportSummary::new(budget.stored, search))
}

/// Run [`export_repositories`] once per entry of [`LANGUAGES`].
pub fn export_languages(
    client: &RepositorySearchClient,
    lake: &Datalake,
    sort: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<(&'static str, ExportSummary)>> {
    let mut results = Vec::with_capacity(LANGUAGES.len());
    for language in LANGUAGES {
        let mut query = SearchQuery::for_language(language).page_size(client.page_size());
        if let Some(sort) = sort {
            query = query.sort(sort);
        }
        let summary = export_repositories(client, lake, &query, limit)?;
        results.push((language, summary));
    }
    Ok(results)
}

/// Scrape questions tagged `tag` and store each one as `{qid}.json`.
pub fn export_questions(
    scraper: &TaggedQuestionScraper,
    lake: &Datalake,
    tag: &str,
    limit: Option<usize>,
) -> Result<ExportSummary> {
    let mut budget = Budget::new(limit);

    let search = scraper.search_questions(tag, |question| {
        budget.admit(|| {
            lake.store_json(
                &question.qid.to_string(),
                question,
                &question_attributes(question),
            )?;
            Ok(())
        })
    })?;

    Ok(ExportSummary::new(budget.stored, search))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_repository_attributes() {
        let repo = json!({"id": 1, "full_name": "rust-lang/rust", "language": null});
        let attrs = repository_attributes(&repo, "stars:>1000");

        assert_eq!(attrs.get("full_name").map(String::as_str), Some("rust-lang/rust"));
        assert!(!attrs.contains_key("language"));
        assert_eq!(attrs.get("query").map(String::as_str), Some("stars:>1000"));
    }

    #[test]
    fn test_budget_stops_at_limit() {
        let mut budget = Budget::new(Some(2));
        assert_eq!(budget.admit(|| Ok(())).unwrap(), Flow::Continue);
        assert_eq!(budget.admit(|| Ok(())).unwrap(), Flow::Stop);
        assert_eq!(budget.admit(|| panic!("over the limit")).unwrap(), Flow::Stop);
        assert_eq!(budget.stored, 2);
    }

    #[test]
    fn test_budget_zero_stores_nothing() {
        let mut budget = Budget::new(Some(0));
        assert_eq!(budget.admit(|| panic!("nothing to store")).unwrap(), Flow::Stop);
        assert_eq!(budget.stored, 0);
    }

    #[test]
    fn test_question_attributes() {
        let question = Question {
            qid: 9,
            link: "https://stackoverflow.com/questions/9/x".to_string(),
            title: "x".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let attrs = question_attributes(&question);
        assert_eq!(attrs["tags"], "a,b");
        assert_eq!(attrs["title"], "x");
    }
}
