//! Post and comment form validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name → messages, in a stable order for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Raw post form as submitted. `group` is the selected group id, or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl PostInput {
    /// Form pre-filled from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
        }
    }

    /// Validate against the groups offered as choices.
    pub fn clean(&self, groups: &[Group]) -> Result<CleanPost, FieldErrors> {
        let mut errors = FieldErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .map(str::to_string);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanPost {
            text: text.to_string(),
            group_id,
            image,
        })
    }
}

/// A validated post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: String,
}

impl CommentInput {
    pub fn clean(&self) -> Result<String, FieldErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}

/// A form as handed to templates: submitted values plus field errors.
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm<T> {
    pub data: T,
    pub errors: FieldErrors,
}

impl<T> BoundForm<T> {
    pub fn unbound(data: T) -> Self {
        Self {
            data,
            errors: FieldErrors::default(),
        }
    }

    pub fn with_errors(data: T, errors: FieldErrors) -> Self {
        Self { data, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 7,
            title: "News".to_string(),
            slug: "news".to_string(),
            description: String::new(),
        }]
    }

    #[test]
    fn test_clean_post_trims_and_resolves_group() {
        let input = PostInput {
            text: "  Hello  ".to_string(),
            group: Some("7".to_string()),
            image: Some(" ".to_string()),
        };
        let clean = input.clean(&groups()).unwrap();
        assert_eq!(clean.text, "Hello");
        assert_eq!(clean.group_id, Some(7));
        assert_eq!(clean.image, None);
    }

    #[test]
    fn test_blank_text_is_required() {
        let input = PostInput {
            text: " \n ".to_string(),
            ..Default::default()
        };
        let errors = input.clean(&groups()).unwrap_err();
        assert_eq!(errors.get("text"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_unknown_group_is_invalid_choice() {
        for raw in ["8", "news", "-1"] {
            let input = PostInput {
                text: "Hello".to_string(),
                group: Some(raw.to_string()),
                image: None,
            };
            let errors = input.clean(&groups()).unwrap_err();
            assert_eq!(errors.get("group"), Some(&[INVALID_CHOICE.to_string()][..]));
            assert!(errors.get("text").is_none());
        }
    }

    #[test]
    fn test_empty_group_means_no_group() {
        let input = PostInput {
            text: "Hello".to_string(),
            group: Some(String::new()),
            image: Some("posts/cat.gif".to_string()),
        };
        let clean = input.clean(&[]).unwrap();
        assert_eq!(clean.group_id, None);
        assert_eq!(clean.image.as_deref(), Some("posts/cat.gif"));
    }

    #[test]
    fn test_comment_text_required() {
        assert!(CommentInput { text: "  ".to_string() }.clean().is_err());
        assert_eq!(
            CommentInput { text: " Nice ".to_string() }.clean().unwrap(),
            "Nice"
        );
    }
}
