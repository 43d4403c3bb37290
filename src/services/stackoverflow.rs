// src/services/stackoverflow.rs

//! Stack Overflow tagged-question scraper.
//!
//! The listing has no total count. Each page's pager carries a `rel="next"`
//! link, and its absence ends the search.

use std::sync::Arc;

use url::Url;

use crate::diagnostics::Sink;
use crate::error::{AppError, Result};
use crate::models::{Question, StackOverflowConfig};
use crate::search::{Continuation, Flow, PageSource, PagedSearchIterator, ResultPage, SearchSummary};
use crate::services::questions::QuestionPage;
use crate::utils::http::{Request, Transport};

const TARGET: &str = "stackoverflow";

/// Scraper for `questions/tagged/{tag}`.
pub struct TaggedQuestionScraper {
    transport: Arc<dyn Transport>,
    site: Url,
    tab: String,
    max_pages: Option<u32>,
    sink: Sink,
}

impl TaggedQuestionScraper {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &StackOverflowConfig,
        sink: Sink,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            site: Url::parse(&config.site_url)?,
            tab: config.tab.clone(),
            max_pages: config.max_pages,
            sink,
        })
    }

    /// Scrape every question tagged `tag`, newest first.
    pub fn search_tag<P, I>(&self, tag: &str, on_page: P, on_item: I) -> Result<SearchSummary>
    where
        P: FnMut(&ResultPage<Question>) -> Result<Flow>,
        I: FnMut(&Question) -> Result<Flow>,
    {
        self.search_tag_from(tag, 1, on_page, on_item)
    }

    /// Like [`search_tag`](Self::search_tag), starting at `start_page`.
    pub fn search_tag_from<P, I>(
        &self,
        tag: &str,
        start_page: u32,
        on_page: P,
        on_item: I,
    ) -> Result<SearchSummary>
    where
        P: FnMut(&ResultPage<Question>) -> Result<Flow>,
        I: FnMut(&Question) -> Result<Flow>,
    {
        self.sink.info(
            TARGET,
            &format!("Searching StackOverflow for questions with tag: {tag}"),
        );

        let pages = TaggedPages { scraper: self, tag };
        PagedSearchIterator::new(&pages, Arc::clone(&self.sink))
            .start_page(start_page)
            .max_pages(self.max_pages)
            .run(on_page, on_item)
    }

    /// Scrape questions for `tag`, calling `on_item` per question.
    pub fn search_questions<F>(&self, tag: &str, on_item: F) -> Result<SearchSummary>
    where
        F: FnMut(&Question) -> Result<Flow>,
    {
        self.search_tag(tag, |_| Ok(Flow::Continue), on_item)
    }

    fn tag_url(&self, tag: &str) -> Result<Url> {
        let mut url = self.site.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("site url cannot be a base: {}", self.site)))?
            .pop_if_empty()
            .extend(["questions", "tagged", tag]);
        Ok(url)
    }
}

struct TaggedPages<'a> {
    scraper: &'a TaggedQuestionScraper,
    tag: &'a str,
}

impl PageSource for TaggedPages<'_> {
    type Item = Question;

    fn name(&self) -> &str {
        TARGET
    }

    fn fetch_page(&self, page: u32) -> Result<ResultPage<Question>> {
        let url = self.scraper.tag_url(self.tag)?;
        let request = Request::get(url.as_str()).query(vec![
            ("tab".to_string(), self.scraper.tab.clone()),
            ("page".to_string(), page.to_string()),
        ]);
        let html = self.scraper.transport.get(&request)?;

        let document = QuestionPage::parse(&html, &self.scraper.site);
        let items = document.questions()?;
        let pager = document.pager()?;

        let next = match pager.next {
            Some(next) => {
                let last = pager
                    .last
                    .map_or_else(|| "?".to_string(), |last| last.to_string());
                self.scraper
                    .sink
                    .debug(TARGET, &format!("Retrieving page {next} of {last}"));
                Continuation::Next(next)
            }
            None => Continuation::Done,
        };

        Ok(ResultPage {
            number: page,
            items,
            total_count: None,
            last_page: pager.last,
            next,
        })
    }
}
