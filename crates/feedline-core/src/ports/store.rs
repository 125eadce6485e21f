//! Entity store port - the single owner of users, groups, posts, comments and follows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostView, User,
};
use crate::error::RepoError;

/// Which posts a feed read selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post.
    All,
    /// Posts in the group with this slug.
    Group { slug: String },
    /// Posts by this username; `viewer` is used to report the follow status.
    Author {
        username: String,
        viewer: Option<Uuid>,
    },
    /// Posts by every author `follower` follows.
    FollowedBy { follower: Uuid },
}

/// The entity a scoped feed hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAnchor {
    None,
    Group(Group),
    Author {
        author: User,
        followed_by_viewer: bool,
    },
}

/// Result of one feed read: the anchor and its posts, newest first.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub anchor: FeedAnchor,
    pub posts: Vec<PostView>,
}

/// A post with its comments, oldest comment first.
#[derive(Debug, Clone)]
pub struct PostThread {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

/// Durable storage for every entity.
///
/// Implementations must honour these invariants inside a single transaction
/// (or lock scope) per call:
/// - deleting a user deletes their posts, their comments, the comments on
///   their posts and every follow edge touching them;
/// - deleting a group clears the group reference of its posts;
/// - deleting a post deletes its comments;
/// - a follow edge never points at its own follower and exists at most once
///   per pair;
/// - listings are ordered by `created_at` descending, then id descending.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User, RepoError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError>;

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RepoError>;
    async fn find_group(&self, id: i64) -> Result<Option<Group>, RepoError>;
    /// All groups ordered by title.
    async fn list_groups(&self) -> Result<Vec<Group>, RepoError>;
    async fn delete_group(&self, id: i64) -> Result<(), RepoError>;

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError>;
    /// Update in place; fails with [`RepoError::NotFound`] for unknown ids.
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError>;
    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
    async fn find_post(&self, id: i64) -> Result<Option<PostView>, RepoError>;
    async fn read_post_thread(&self, id: i64) -> Result<Option<PostThread>, RepoError>;

    /// Read a whole feed as one logical read. `None` when the scope's
    /// group or author does not exist.
    async fn read_feed(&self, scope: &FeedScope) -> Result<Option<FeedSnapshot>, RepoError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Create a follow edge. Returns `false` when it already existed.
    /// Self-follows are rejected with [`RepoError::Constraint`].
    async fn insert_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError>;
    /// Returns `false` when there was nothing to delete.
    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError>;
    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError>;
    async fn count_follows(&self) -> Result<u64, RepoError>;
}
