//! Authorization guard - pure decisions about who may mutate what.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Post, User};
use crate::ports::TokenClaims;

/// An authenticated user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
}

/// The acting identity of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(principal) => Some(principal),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.principal().map(|p| p.user_id)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Actor::Anonymous)
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Principal {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

impl From<Principal> for Actor {
    fn from(principal: Principal) -> Self {
        Actor::Authenticated(principal)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Anonymous actor on a protected action; send them to log in.
    LoginRequired,
    /// Authenticated, but not the post's author.
    NotAuthor,
    /// Following yourself is silently ignored.
    SelfFollow,
    /// The follow edge exists already; silently ignored.
    AlreadyFollowing,
}

impl Access {
    pub fn is_granted(self) -> bool {
        matches!(self, Access::Granted)
    }
}

fn require_login(actor: &Actor) -> Access {
    if actor.is_anonymous() {
        Access::LoginRequired
    } else {
        Access::Granted
    }
}

pub fn can_create_post(actor: &Actor) -> Access {
    require_login(actor)
}

pub fn can_edit_post(actor: &Actor, post: &Post) -> Access {
    match actor.user_id() {
        None => Access::LoginRequired,
        Some(id) if id == post.author_id => Access::Granted,
        Some(_) => Access::NotAuthor,
    }
}

pub fn can_delete_post(actor: &Actor, post: &Post) -> Access {
    can_edit_post(actor, post)
}

pub fn can_comment(actor: &Actor) -> Access {
    require_login(actor)
}

pub fn can_view_followed_feed(actor: &Actor) -> Access {
    require_login(actor)
}

pub fn can_follow(actor: &Actor, target: &User, already_following: bool) -> Access {
    match actor.user_id() {
        None => Access::LoginRequired,
        Some(id) if id == target.id => Access::SelfFollow,
        Some(_) if already_following => Access::AlreadyFollowing,
        Some(_) => Access::Granted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor_for(user: &User) -> Actor {
        Actor::Authenticated(Principal {
            user_id: user.id,
            username: user.username.clone(),
        })
    }

    fn post_by(user: &User) -> Post {
        Post {
            id: 1,
            text: "Hello".to_string(),
            created_at: Utc::now(),
            author_id: user.id,
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn test_anonymous_must_log_in() {
        let author = User::new("author");
        let anon = Actor::Anonymous;

        assert_eq!(can_create_post(&anon), Access::LoginRequired);
        assert_eq!(can_comment(&anon), Access::LoginRequired);
        assert_eq!(can_view_followed_feed(&anon), Access::LoginRequired);
        assert_eq!(can_edit_post(&anon, &post_by(&author)), Access::LoginRequired);
        assert_eq!(can_follow(&anon, &author, false), Access::LoginRequired);
    }

    #[test]
    fn test_only_author_may_edit() {
        let author = User::new("author");
        let other = User::new("other");
        let post = post_by(&author);

        assert!(can_edit_post(&actor_for(&author), &post).is_granted());
        assert_eq!(can_edit_post(&actor_for(&other), &post), Access::NotAuthor);
        assert_eq!(can_delete_post(&actor_for(&other), &post), Access::NotAuthor);
    }

    #[test]
    fn test_follow_rules() {
        let me = User::new("me");
        let them = User::new("them");

        assert!(can_follow(&actor_for(&me), &them, false).is_granted());
        assert_eq!(can_follow(&actor_for(&me), &me, false), Access::SelfFollow);
        assert_eq!(
            can_follow(&actor_for(&me), &them, true),
            Access::AlreadyFollowing
        );
    }
}
