//! Data Transfer Objects - query strings and small JSON payloads.

use serde::{Deserialize, Serialize};

/// `?page=` as sent by feed links. Kept raw: non-numeric values are valid
/// input and fall back to the first page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub cache: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_keeps_raw_value() {
        let query: PageQuery = serde_json::from_str(r#"{"page": "abc"}"#).unwrap();
        assert_eq!(query.page(), Some("abc"));

        let query: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page(), None);
    }
}
