// src/lib.rs

//! Data lake exporter library.
//!
//! Pulls GitHub repository search results and Stack Overflow tagged
//! questions page by page, and stores them as attribute-tagged JSON
//! objects in a date-partitioned HDFS layout.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod services;
pub mod storage;
pub mod utils;
