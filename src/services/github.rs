// src/services/github.rs

//! GitHub repository search over the REST API.
//!
//! Calls go straight to the REST endpoints with basic auth: one request per
//! result page, plus a `rate_limit` request when something fails.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::diagnostics::Sink;
use crate::error::{AppError, Result};
use crate::models::{GitHubConfig, RateLimit, SearchQuery};
use crate::search::{Continuation, Flow, PageSource, PagedSearchIterator, ResultPage, SearchSummary};
use crate::utils::http::{Credentials, Request, Transport};

/// Media type for the v3 REST API.
pub const CONTENT_TYPE: &str = "application/vnd.github.v3+json";

const TARGET: &str = "github";

/// Languages exported by the `languages` command, one search each.
pub const LANGUAGES: [&str; 40] = [
    "JavaScript", "Rust", "Python", "C++", "Java",
    "Dart", "TypeScript", "C", "Go", "CSS",
    "PHP", "C#", "Clojure", "Assembly", "Nunjucks",
    "Ruby", "Dockerfile", "HTML", "Shell", "Vue",
    "Kotlin", "Swift", "Julia", "Markdown", "Jupyter Notebook",
    "Objective-C", "SCSS", "TeX", "Scala", "Lua",
    "Makefile", "Haskell", "Less", "V", "Batchfile",
    "OCaml", "Standard ML", "Elixir", "Crystal", "CoffeeScript",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: Remaining,
    search: Remaining,
}

#[derive(Debug, Deserialize)]
struct Remaining {
    remaining: u64,
}

/// Client for `search/repositories`.
pub struct RepositorySearchClient {
    transport: Arc<dyn Transport>,
    api_url: String,
    credentials: Option<Credentials>,
    page_size: u32,
    max_pages: u32,
    sink: Sink,
}

impl RepositorySearchClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &GitHubConfig,
        credentials: Option<Credentials>,
        sink: Sink,
    ) -> Self {
        Self {
            transport,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            page_size: config.page_size,
            max_pages: config.max_pages,
            sink,
        }
    }

    /// A query using the configured page size.
    pub fn query(&self, text: impl Into<String>) -> SearchQuery {
        SearchQuery::new(text).page_size(self.page_size)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch and log the remaining core and search quota.
    pub fn log_limits(&self) -> Result<RateLimit> {
        let response: RateLimitResponse = self.get_json("rate_limit", Vec::new())?;
        let limits = RateLimit {
            core_remaining: response.resources.core.remaining,
            search_remaining: response.resources.search.remaining,
        };
        self.sink.debug(
            TARGET,
            &format!(
                "Remaining core: {}, remaining search: {}",
                limits.core_remaining, limits.search_remaining
            ),
        );
        Ok(limits)
    }

    /// Search repositories, calling `on_item` for each repository.
    pub fn search_repositories<F>(&self, query: &SearchQuery, on_item: F) -> Result<SearchSummary>
    where
        F: FnMut(&Value) -> Result<Flow>,
    {
        self.search(query, |_| Ok(Flow::Continue), on_item)
    }

    /// Search repositories with both a page and an item callback.
    pub fn search<P, I>(&self, query: &SearchQuery, on_page: P, on_item: I) -> Result<SearchSummary>
    where
        P: FnMut(&ResultPage<Value>) -> Result<Flow>,
        I: FnMut(&Value) -> Result<Flow>,
    {
        self.sink
            .info(TARGET, &format!("Searching GitHub repositories: {}", query.text));

        let pages = RepositoryPages {
            client: self,
            query,
        };
        PagedSearchIterator::new(&pages, Arc::clone(&self.sink))
            .start_page(query.start_page)
            .max_pages(Some(self.max_pages))
            .run(on_page, on_item)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: Vec<(String, String)>) -> Result<T> {
        let request = Request::get(format!("{}/{}", self.api_url, endpoint))
            .query(params)
            .accept(CONTENT_TYPE)
            .auth(self.credentials.clone());
        let body = self.transport.get(&request)?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::decode(format!("{endpoint}: {e}")))
    }
}

/// One search's view of the REST pagination.
struct RepositoryPages<'a> {
    client: &'a RepositorySearchClient,
    query: &'a SearchQuery,
}

impl PageSource for RepositoryPages<'_> {
    type Item = Value;

    fn name(&self) -> &str {
        TARGET
    }

    fn fetch_page(&self, page: u32) -> Result<ResultPage<Value>> {
        let response: SearchResponse = self
            .client
            .get_json("search/repositories", self.query.params(page))?;

        let page_size = u64::from(self.query.page_size.max(1));
        let max_pages = response.total_count.div_ceil(page_size);
        self.client.sink.debug(
            TARGET,
            &format!(
                "Total count: {}.  Page {} of {}",
                response.total_count, page, max_pages
            ),
        );

        Ok(ResultPage {
            number: page,
            items: response.items,
            total_count: Some(response.total_count),
            last_page: u32::try_from(max_pages).ok(),
            next: if u64::from(page) >= max_pages {
                Continuation::Done
            } else {
                Continuation::Next(page + 1)
            },
        })
    }

    fn log_usage(&self) {
        if let Err(e) = self.client.log_limits() {
            self.client
                .sink
                .warn(TARGET, &format!("Unable to read rate limits: {e}"));
        }
    }
}
