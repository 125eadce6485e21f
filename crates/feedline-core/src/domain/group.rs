use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const TITLE_MAX_LEN: usize = 200;

/// Thematic group that posts can be published into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A group that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl NewGroup {
    /// Validates the title length and that the slug is URL-safe.
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let slug = slug.into();

        if title.trim().is_empty() || title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "Group title must be 1 to {} characters",
                TITLE_MAX_LEN
            )));
        }
        if !is_valid_slug(&slug) {
            return Err(DomainError::Validation(format!(
                "Invalid group slug: {:?}",
                slug
            )));
        }

        Ok(Self {
            title,
            slug,
            description: description.into(),
        })
    }
}

/// Slugs may contain ASCII letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("test-slug"));
        assert!(is_valid_slug("news_2024"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("путь"));
    }

    #[test]
    fn test_new_group_rejects_bad_input() {
        assert!(NewGroup::new("News", "news", "All the news").is_ok());
        assert!(matches!(
            NewGroup::new("News", "bad/slug", ""),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            NewGroup::new("x".repeat(201), "long", ""),
            Err(DomainError::Validation(_))
        ));
    }
}
