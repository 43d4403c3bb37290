//! Pipeline entry points for export runs.
//!
//! - `export_repositories`: GitHub search results into the lake
//! - `export_languages`: one repository export per tracked language
//! - `export_questions`: Stack Overflow tagged questions into the lake

pub mod export;

pub use export::{
    ExportSummary, export_languages, export_questions, export_repositories,
    question_attributes, repository_attributes,
};
