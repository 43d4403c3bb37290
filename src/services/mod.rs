//! Source clients for the exporter.
//!
//! This module contains:
//! - GitHub repository search (`RepositorySearchClient`)
//! - Stack Overflow tagged-question scraping (`TaggedQuestionScraper`)
//! - Listing normalization (`QuestionPage`, `extract_tags`)

pub mod github;
pub mod questions;
pub mod stackoverflow;

pub use github::{LANGUAGES, RepositorySearchClient};
pub use questions::{Pager, QuestionPage, extract_tags};
pub use stackoverflow::TaggedQuestionScraper;
