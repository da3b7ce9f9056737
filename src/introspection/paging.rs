//! Key listing query and page shapes

use serde::{Deserialize, Serialize};

/// Where the search token must appear in a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
}

/// One page request over the keys of a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingQuery {
    /// 1-based; 0 is read as 1
    pub page: u64,
    pub page_size: u64,
    pub pattern: Option<String>,
    pub mode: MatchMode,
}

impl Default for PagingQuery {
    fn default() -> Self {
        PagingQuery {
            page: 1,
            page_size: 20,
            pattern: None,
            mode: MatchMode::Contains,
        }
    }
}

impl PagingQuery {
    pub fn new(page: u64, page_size: u64) -> Self {
        PagingQuery { page, page_size, ..Default::default() }
    }

    pub fn matching(mut self, token: impl Into<String>, mode: MatchMode) -> Self {
        self.pattern = Some(token.into());
        self.mode = mode;
        self
    }

    /// Glob handed to SCAN MATCH
    pub fn glob(&self) -> String {
        match self.pattern.as_deref().filter(|token| !token.is_empty()) {
            None => "*".to_string(),
            Some(token) => {
                let token = escape_glob(token);
                match self.mode {
                    MatchMode::Contains => format!("*{}*", token),
                    MatchMode::StartsWith => format!("{}*", token),
                    MatchMode::EndsWith => format!("*{}", token),
                }
            }
        }
    }

    /// Matches to pass over before the page starts
    pub fn skip(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size)
    }
}

/// A listed key and its native type name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeyItem {
    pub key: String,
    pub key_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeyPage {
    /// Keys in the whole database, not just the matching ones
    pub total: i64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<KeyItem>,
}

/// Backslash-escape SCAN glob metacharacters so the token matches literally
fn escape_glob(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
