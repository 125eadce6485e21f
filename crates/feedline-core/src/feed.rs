//! Feed composition - one composer per feed kind, each a single store read.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Group, PostView, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{EntityStore, FeedAnchor, FeedScope, FeedSnapshot};

/// The closed set of feeds the platform serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    Global,
    Group { slug: String },
    Profile { username: String, viewer: Option<Uuid> },
    Followed { viewer: Uuid },
}

/// An ordered feed, newest post first, before pagination.
#[derive(Debug, Clone)]
pub enum Feed {
    Global {
        posts: Vec<PostView>,
    },
    Group {
        group: Group,
        posts: Vec<PostView>,
    },
    Profile {
        author: User,
        is_followed_by_viewer: bool,
        posts: Vec<PostView>,
    },
    Followed {
        posts: Vec<PostView>,
    },
}

/// Builds feeds from the entity store.
#[derive(Clone)]
pub struct FeedComposer {
    store: Arc<dyn EntityStore>,
}

impl FeedComposer {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn compose(&self, request: &FeedRequest) -> Result<Feed, DomainError> {
        match request {
            FeedRequest::Global => self.global_feed().await,
            FeedRequest::Group { slug } => self.group_feed(slug).await,
            FeedRequest::Profile { username, viewer } => {
                self.profile_feed(username, *viewer).await
            }
            FeedRequest::Followed { viewer } => self.followed_feed(*viewer).await,
        }
    }

    /// All posts, newest first.
    pub async fn global_feed(&self) -> Result<Feed, DomainError> {
        let snapshot = self
            .read(&FeedScope::All)
            .await?
            .ok_or_else(|| RepoError::Query("global feed read returned nothing".to_string()))?;

        Ok(Feed::Global {
            posts: snapshot.posts,
        })
    }

    /// Posts in the group identified by `slug`.
    pub async fn group_feed(&self, slug: &str) -> Result<Feed, DomainError> {
        let scope = FeedScope::Group {
            slug: slug.to_string(),
        };
        let snapshot = self
            .read(&scope)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", slug))?;

        match snapshot.anchor {
            FeedAnchor::Group(group) => Ok(Feed::Group {
                group,
                posts: snapshot.posts,
            }),
            other => Err(unexpected_anchor("group", &other)),
        }
    }

    /// Posts by `username`, plus whether `viewer` follows that author.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Feed, DomainError> {
        let scope = FeedScope::Author {
            username: username.to_string(),
            viewer,
        };
        let snapshot = self
            .read(&scope)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))?;

        match snapshot.anchor {
            FeedAnchor::Author {
                author,
                followed_by_viewer,
            } => Ok(Feed::Profile {
                author,
                // Anonymous viewers never follow anyone.
                is_followed_by_viewer: viewer.is_some() && followed_by_viewer,
                posts: snapshot.posts,
            }),
            other => Err(unexpected_anchor("profile", &other)),
        }
    }

    /// Posts by every author `viewer` follows. Empty when they follow nobody.
    pub async fn followed_feed(&self, viewer: Uuid) -> Result<Feed, DomainError> {
        let posts = self
            .read(&FeedScope::FollowedBy { follower: viewer })
            .await?
            .map(|snapshot| snapshot.posts)
            .unwrap_or_default();

        Ok(Feed::Followed { posts })
    }

    async fn read(&self, scope: &FeedScope) -> Result<Option<FeedSnapshot>, DomainError> {
        let snapshot = self.store.read_feed(scope).await?;
        if let Some(snapshot) = &snapshot {
            tracing::debug!(scope = ?scope, posts = snapshot.posts.len(), "Feed composed");
        }
        Ok(snapshot)
    }
}

fn unexpected_anchor(feed: &str, anchor: &FeedAnchor) -> DomainError {
    tracing::error!(feed, anchor = ?anchor, "Store returned a mismatched feed anchor");
    RepoError::Query(format!("unexpected anchor for {} feed", feed)).into()
}
