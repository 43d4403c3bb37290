// src/models/mod.rs

//! Domain models for the exporter.

mod config;
mod question;
mod search;

pub use config::{
    Config, GitHubConfig, HdfsConfig, HttpConfig, LakeConfig, StackOverflowConfig,
};
pub use question::Question;
pub use search::{Order, RateLimit, SearchQuery};
