//! What a request resolves to: a template with its context, or a redirect.

use serde::Serialize;
use serde_json::Value;

/// Template name plus the context handed to the templating collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub template: &'static str,
    pub context: Value,
}

impl View {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self { template, context }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(View),
    Redirect(String),
}

impl Outcome {
    pub fn render(template: &'static str, context: Value) -> Self {
        Outcome::Render(View::new(template, context))
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Outcome::Redirect(location.into())
    }
}

pub mod templates {
    pub const INDEX: &str = "posts/index.html";
    pub const GROUP_LIST: &str = "posts/group_list.html";
    pub const PROFILE: &str = "posts/profile.html";
    pub const POST_DETAIL: &str = "posts/post_detail.html";
    pub const POST_FORM: &str = "posts/create_post.html";
    pub const FOLLOW: &str = "posts/follow.html";
}

/// URL builders for every route the core redirects to.
pub mod paths {
    pub fn profile(username: &str) -> String {
        format!("/profile/{}/", urlencoding::encode(username))
    }

    pub fn profile_follow(username: &str) -> String {
        format!("/profile/{}/follow/", urlencoding::encode(username))
    }

    pub fn profile_unfollow(username: &str) -> String {
        format!("/profile/{}/unfollow/", urlencoding::encode(username))
    }

    pub fn follow_index() -> String {
        "/follow/".to_string()
    }

    pub fn post_create() -> String {
        "/create/".to_string()
    }

    pub fn post_detail(post_id: i64) -> String {
        format!("/posts/{}/", post_id)
    }

    pub fn post_edit(post_id: i64) -> String {
        format!("/posts/{}/edit/", post_id)
    }

    pub fn post_comment(post_id: i64) -> String {
        format!("/posts/{}/comment/", post_id)
    }

    pub fn post_delete(post_id: i64) -> String {
        format!("/posts/{}/delete/", post_id)
    }

    /// Login entry point carrying the path to return to afterwards.
    pub fn login(login_url: &str, next: &str) -> String {
        let separator = if login_url.contains('?') { '&' } else { '?' };
        let next = urlencoding::encode(next).replace("%2F", "/");
        format!("{}{}next={}", login_url, separator, next)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_login_keeps_slashes_in_next() {
            assert_eq!(
                login("/auth/login/", &post_edit(3)),
                "/auth/login/?next=/posts/3/edit/"
            );
            assert_eq!(
                login("/login?from=blog", "/create/"),
                "/login?from=blog&next=/create/"
            );
        }

        #[test]
        fn test_profile_path_escapes_username() {
            assert_eq!(profile("Test Author"), "/profile/Test%20Author/");
            assert_eq!(profile("TestAuthor"), "/profile/TestAuthor/");
        }
    }
}
