//! Search request parameters and quota snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort direction requested from a search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search invocation's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query (`q`)
    pub text: String,
    /// Optional sort key, e.g. `stars`
    pub sort: Option<String>,
    pub order: Order,
    pub page_size: u32,
    /// First page to request
    pub start_page: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sort: None,
            order: Order::Desc,
            page_size: 100,
            start_page: 1,
        }
    }

    /// Query for repositories written in one language.
    pub fn for_language(language: &str) -> Self {
        Self::new(format!("language:\"{language}\""))
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page.max(1);
        self
    }

    /// Query string parameters for one page, in request order.
    pub fn params(&self, page: u32) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.text.clone()),
            ("order".to_string(), self.order.to_string()),
            ("per_page".to_string(), self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.clone()));
        }
        params.push(("page".to_string(), page.to_string()));
        params
    }
}

/// Remaining request quota reported by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub core_remaining: u64,
    pub search_remaining: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_without_sort() {
        let params = SearchQuery::new("language:rust").params(2);
        let keys: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["q", "order", "per_page", "page"]);
        assert_eq!(params[1].1, "desc");
        assert_eq!(params[3].1, "2");
    }

    #[test]
    fn test_params_with_sort() {
        let params = SearchQuery::new("tetris")
            .sort("stars")
            .order(Order::Asc)
            .params(1);
        assert!(params.contains(&("sort".to_string(), "stars".to_string())));
        assert!(params.contains(&("order".to_string(), "asc".to_string())));
    }

    #[test]
    fn test_for_language_quotes_name() {
        let query = SearchQuery::for_language("Jupyter Notebook");
        assert_eq!(query.text, "language:\"Jupyter Notebook\"");
        assert_eq!(SearchQuery::new("x").start_page(0).start_page, 1);
    }
}
