// src/services/questions.rs

//! Normalization of Stack Overflow listing pages.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Question;
use crate::search::Flow;
use crate::utils::{page_number, resolve_url};

/// Extract tag names from the `<tag1><tag2>...<tagN>` encoding.
///
/// Returns an empty list when the string is anything other than a clean
/// sequence of tags, so one bad field never aborts a batch.
pub fn extract_tags(tag_string: &str) -> Vec<String> {
    let (Ok(whole), Ok(tag)) = (
        Regex::new(r"^(?:<[^<>\s]+>)*$"),
        Regex::new(r"<([^<>\s]+)>"),
    ) else {
        return Vec::new();
    };

    let trimmed = tag_string.trim();
    if !whole.is_match(trimmed) {
        return Vec::new();
    }
    tag.captures_iter(trimmed)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Pagination links found on a listing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pager {
    /// Page number of the `rel="next"` link
    pub next: Option<u32>,
    /// Page number of the link just before "next", i.e. the last page
    pub last: Option<u32>,
}

/// A parsed page of tagged questions.
pub struct QuestionPage {
    document: Html,
    site: Url,
}

impl QuestionPage {
    /// Parse listing HTML. Permalinks are resolved against `site`.
    pub fn parse(html: &str, site: &Url) -> Self {
        Self {
            document: Html::parse_document(html),
            site: site.clone(),
        }
    }

    /// Every question summary on the page, in page order.
    pub fn questions(&self) -> Result<Vec<Question>> {
        let summary_sel = parse_selector("div.summary")?;
        let link_sel = parse_selector("a.question-hyperlink")?;
        let tags_sel = parse_selector("div.tags")?;
        let tag_sel = parse_selector(r#"a[rel="tag"]"#)?;

        self.document
            .select(&summary_sel)
            .map(|summary| self.parse_summary(summary, &link_sel, &tags_sel, &tag_sel))
            .collect()
    }

    /// Call `callback` for each question until it asks to stop.
    pub fn for_each_question<F>(&self, mut callback: F) -> Result<Flow>
    where
        F: FnMut(Question) -> Flow,
    {
        for question in self.questions()? {
            if callback(question).is_stop() {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Read the pager. A page without a pager has no next page.
    pub fn pager(&self) -> Result<Pager> {
        let pager_sel = parse_selector("div.pager")?;
        let next_sel = parse_selector(r#"a.js-pagination-item[rel="next"]"#)?;

        let Some(pager) = self.document.select(&pager_sel).next() else {
            return Ok(Pager::default());
        };
        let Some(next) = pager.select(&next_sel).next() else {
            return Ok(Pager::default());
        };

        let href = next.value().attr("href").unwrap_or_default();
        let next_page = page_number(href)
            .ok_or_else(|| AppError::decode(format!("next page link without page number: {href:?}")))?;

        let last_page = next
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.value().name() == "a"
                    && el.value().classes().any(|c| c == "js-pagination-item")
            })
            .and_then(|el| el.value().attr("href"))
            .and_then(page_number);

        Ok(Pager {
            next: Some(next_page),
            last: last_page,
        })
    }

    fn parse_summary(
        &self,
        summary: ElementRef,
        link_sel: &Selector,
        tags_sel: &Selector,
        tag_sel: &Selector,
    ) -> Result<Question> {
        let anchor = summary
            .select(link_sel)
            .next()
            .ok_or_else(|| AppError::decode("question summary without a question link"))?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| AppError::decode("question link without href"))?;

        let link = resolve_url(&self.site, href.trim());
        let title = anchor.text().collect::<String>().trim().to_string();
        let qid = question_id(&link)
            .ok_or_else(|| AppError::decode(format!("no question id in {link}")))?;

        let tags = summary
            .select(tags_sel)
            .next()
            .ok_or_else(|| AppError::decode(format!("question {qid} has no tag list")))?
            .select(tag_sel)
            .map(|a| a.text().collect::<String>().trim().to_string())
            .collect();

        Ok(Question {
            qid,
            link,
            title,
            tags,
        })
    }
}

fn question_id(link: &str) -> Option<u64> {
    let pattern = Regex::new(r"/questions/(\d+)/").ok()?;
    pattern
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
