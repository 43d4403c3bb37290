// src/search.rs

//! Paginated search driver shared by every source client.
//!
//! A [`PageSource`] knows how to fetch one page and where the next one is.
//! [`PagedSearchIterator`] runs the loop:
//!
//! ```text
//! START -> FETCH_PAGE -> page callback -> item callbacks -> { next page | stop }
//! ```
//!
//! Callbacks answer with [`Flow`]. A stop request, running out of pages and
//! reaching the page ceiling all end the search with `Ok`.

use std::fmt;

use crate::diagnostics::Sink;
use crate::error::{AppError, Result};

/// Answer from a search callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

impl From<bool> for Flow {
    /// `false` requests a stop.
    fn from(keep_going: bool) -> Self {
        if keep_going { Flow::Continue } else { Flow::Stop }
    }
}

/// Where the search goes after a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Fetch this page number next
    Next(u32),
    /// No more pages
    Done,
}

/// One fetched page of results.
#[derive(Debug, Clone)]
pub struct ResultPage<T> {
    /// Page number as requested
    pub number: u32,
    pub items: Vec<T>,
    /// Total matches reported by the server, when it reports one
    pub total_count: Option<u64>,
    /// Last page number, when the server exposes it
    pub last_page: Option<u32>,
    pub next: Continuation,
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every page was visited
    Exhausted,
    /// A callback returned [`Flow::Stop`]
    Stopped,
    /// The page ceiling was hit while more pages remained
    CeilingReached,
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchOutcome::Exhausted => "exhausted",
            SearchOutcome::Stopped => "stopped",
            SearchOutcome::CeilingReached => "ceiling reached",
        };
        f.write_str(label)
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    pub outcome: SearchOutcome,
    /// Pages fetched
    pub pages: u32,
    /// Items handed to the item callback
    pub items: usize,
}

/// A paginated endpoint.
pub trait PageSource {
    type Item;

    /// Diagnostic target for messages about this source.
    fn name(&self) -> &str;

    /// Fetch one page.
    fn fetch_page(&self, page: u32) -> Result<ResultPage<Self::Item>>;

    /// Report remaining quota after a failure. Must not fail.
    fn log_usage(&self) {}
}

/// Drives a [`PageSource`] until it is exhausted, stopped or capped.
pub struct PagedSearchIterator<'a, S: PageSource> {
    source: &'a S,
    sink: Sink,
    start_page: u32,
    max_pages: Option<u32>,
}

impl<'a, S: PageSource> PagedSearchIterator<'a, S> {
    pub fn new(source: &'a S, sink: Sink) -> Self {
        Self {
            source,
            sink,
            start_page: 1,
            max_pages: None,
        }
    }

    pub fn start_page(mut self, page: u32) -> Self {
        self.start_page = page.max(1);
        self
    }

    /// Cap the number of pages fetched. `None` means unbounded.
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Run the search.
    ///
    /// Any error, from the source or from a callback, triggers
    /// [`PageSource::log_usage`] and is then returned unchanged.
    pub fn run<P, I>(&self, mut on_page: P, mut on_item: I) -> Result<SearchSummary>
    where
        P: FnMut(&ResultPage<S::Item>) -> Result<Flow>,
        I: FnMut(&S::Item) -> Result<Flow>,
    {
        self.drive(&mut on_page, &mut on_item).inspect_err(|_| {
            self.source.log_usage();
        })
    }

    fn drive<P, I>(&self, on_page: &mut P, on_item: &mut I) -> Result<SearchSummary>
    where
        P: FnMut(&ResultPage<S::Item>) -> Result<Flow>,
        I: FnMut(&S::Item) -> Result<Flow>,
    {
        let mut page = self.start_page;
        let mut summary = SearchSummary {
            outcome: SearchOutcome::Exhausted,
            pages: 0,
            items: 0,
        };

        loop {
            let result = self.source.fetch_page(page)?;
            summary.pages += 1;

            if on_page(&result)?.is_stop() {
                summary.outcome = SearchOutcome::Stopped;
                return Ok(summary);
            }

            for item in &result.items {
                summary.items += 1;
                if on_item(item)?.is_stop() {
                    summary.outcome = SearchOutcome::Stopped;
                    return Ok(summary);
                }
            }

            let next = match result.next {
                Continuation::Done => return Ok(summary),
                Continuation::Next(next) => next,
            };

            if next <= page {
                return Err(AppError::decode(format!(
                    "{}: page {} points back to page {}",
                    self.source.name(),
                    page,
                    next
                )));
            }

            if self.max_pages.is_some_and(|max| summary.pages >= max) {
                self.sink.warn(
                    self.source.name(),
                    &format!(
                        "Unable to retrieve all items due to API limits: stopped after {} pages",
                        summary.pages
                    ),
                );
                summary.outcome = SearchOutcome::CeilingReached;
                return Ok(summary);
            }

            page = next;
        }
    }
}
