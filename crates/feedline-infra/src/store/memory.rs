//! In-memory entity store - used when no database is configured, and in tests.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use feedline_core::domain::{
    AuthorRef, Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost, Post,
    PostChanges, PostView, User,
};
use feedline_core::error::RepoError;
use feedline_core::ports::{EntityStore, FeedAnchor, FeedScope, FeedSnapshot, PostThread};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: BTreeMap<i64, Follow>,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
    last_follow_id: i64,
}

impl Tables {
    fn author_ref(&self, id: Uuid) -> Result<AuthorRef, RepoError> {
        self.users
            .get(&id)
            .map(|user| AuthorRef {
                id: user.id,
                username: user.username.clone(),
            })
            .ok_or_else(|| RepoError::Query(format!("dangling author reference {}", id)))
    }

    fn post_view(&self, post: &Post) -> Result<PostView, RepoError> {
        Ok(PostView {
            post: post.clone(),
            author: self.author_ref(post.author_id)?,
            group: post.group_id.and_then(|id| self.groups.get(&id).cloned()),
        })
    }

    /// Newest first, ties broken by id.
    fn post_views<'a>(
        &self,
        posts: impl Iterator<Item = &'a Post>,
    ) -> Result<Vec<PostView>, RepoError> {
        let mut posts: Vec<&Post> = posts.collect();
        posts.sort_by_key(|post| Reverse((post.created_at, post.id)));
        posts.into_iter().map(|post| self.post_view(post)).collect()
    }

    fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    fn is_following(&self, follower: Uuid, followed: Uuid) -> bool {
        self.follows
            .values()
            .any(|f| f.follower_id == follower && f.followed_id == followed)
    }

    fn require_user(&self, id: Uuid) -> Result<(), RepoError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("user {} does not exist", id)))
        }
    }

    fn require_group(&self, id: Option<i64>) -> Result<(), RepoError> {
        match id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(RepoError::Constraint(format!("group {} does not exist", id)))
            }
            _ => Ok(()),
        }
    }

    fn remove_post(&mut self, id: i64) {
        self.posts.remove(&id);
        self.comments.retain(|_, comment| comment.post_id != id);
    }
}

/// Entity store over process-local tables behind one async `RwLock`.
///
/// Every call takes the lock once, so cascades and feed reads are atomic.
#[derive(Default)]
pub struct InMemoryEntityStore {
    tables: RwLock<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) || tables.user_by_username(&user.username).is_some() {
            return Err(RepoError::Constraint(format!(
                "user {} already exists",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.user_by_username(username).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let owned: Vec<i64> = tables
            .posts
            .values()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, comment| comment.author_id != id);
        tables
            .follows
            .retain(|_, f| f.follower_id != id && f.followed_id != id);

        Ok(())
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(RepoError::Constraint(format!(
                "group slug {} already exists",
                group.slug
            )));
        }

        tables.last_group_id += 1;
        let group = Group {
            id: tables.last_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepoError> {
        let mut groups: Vec<Group> = self.tables.read().await.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(post.author_id)?;
        tables.require_group(post.group_id)?;

        tables.last_post_id += 1;
        let post = Post {
            id: tables.last_post_id,
            text: post.text,
            created_at: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_group(changes.group_id)?;

        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.text = changes.text;
        post.group_id = changes.group_id;
        if let Some(image) = changes.image {
            post.image = Some(image);
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        tables.remove_post(id);
        Ok(())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostView>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|post| tables.post_view(post))
            .transpose()
    }

    async fn read_post_thread(&self, id: i64) -> Result<Option<PostThread>, RepoError> {
        let tables = self.tables.read().await;
        let Some(post) = tables.posts.get(&id) else {
            return Ok(None);
        };

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|comment| comment.post_id == id)
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));

        let comments = comments
            .into_iter()
            .map(|comment| {
                Ok(CommentView {
                    comment: comment.clone(),
                    author: tables.author_ref(comment.author_id)?,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(Some(PostThread {
            post: tables.post_view(post)?,
            comments,
        }))
    }

    async fn read_feed(&self, scope: &FeedScope) -> Result<Option<FeedSnapshot>, RepoError> {
        let tables = self.tables.read().await;

        let snapshot = match scope {
            FeedScope::All => FeedSnapshot {
                anchor: FeedAnchor::None,
                posts: tables.post_views(tables.posts.values())?,
            },
            FeedScope::Group { slug } => {
                let Some(group) = tables.groups.values().find(|g| &g.slug == slug) else {
                    return Ok(None);
                };
                let posts = tables
                    .post_views(tables.posts.values().filter(|p| p.group_id == Some(group.id)))?;
                FeedSnapshot {
                    anchor: FeedAnchor::Group(group.clone()),
                    posts,
                }
            }
            FeedScope::Author { username, viewer } => {
                let Some(author) = tables.user_by_username(username) else {
                    return Ok(None);
                };
                let followed_by_viewer =
                    viewer.is_some_and(|viewer| tables.is_following(viewer, author.id));
                let posts =
                    tables.post_views(tables.posts.values().filter(|p| p.author_id == author.id))?;
                FeedSnapshot {
                    anchor: FeedAnchor::Author {
                        author: author.clone(),
                        followed_by_viewer,
                    },
                    posts,
                }
            }
            FeedScope::FollowedBy { follower } => {
                let posts = tables.post_views(
                    tables
                        .posts
                        .values()
                        .filter(|p| tables.is_following(*follower, p.author_id)),
                )?;
                FeedSnapshot {
                    anchor: FeedAnchor::None,
                    posts,
                }
            }
        };

        Ok(Some(snapshot))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(comment.author_id)?;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }

        tables.last_comment_id += 1;
        let comment = Comment {
            id: tables.last_comment_id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn insert_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        if follower == followed {
            return Err(RepoError::Constraint("users cannot follow themselves".to_string()));
        }

        let mut tables = self.tables.write().await;
        tables.require_user(follower)?;
        tables.require_user(followed)?;
        if tables.is_following(follower, followed) {
            return Ok(false);
        }

        tables.last_follow_id += 1;
        let id = tables.last_follow_id;
        tables.follows.insert(
            id,
            Follow {
                id,
                follower_id: follower,
                followed_id: followed,
            },
        );
        Ok(true)
    }

    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.follower_id == follower && f.followed_id == followed));
        Ok(tables.follows.len() < before)
    }

    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        Ok(self.tables.read().await.is_following(follower, followed))
    }

    async fn count_follows(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.follows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryEntityStore, User, User) {
        let store = InMemoryEntityStore::new();
        let leo = store.insert_user(User::new("leo")).await.unwrap();
        let mia = store.insert_user(User::new("mia")).await.unwrap();
        (store, leo, mia)
    }

    fn new_post(author: &User, text: &str, group_id: Option<i64>) -> NewPost {
        NewPost {
            text: text.to_string(),
            author_id: author.id,
            group_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let (store, leo, _) = seeded().await;
        for text in ["first", "second", "third"] {
            store.insert_post(new_post(&leo, text, None)).await.unwrap();
        }

        let feed = store.read_feed(&FeedScope::All).await.unwrap().unwrap();
        let texts: Vec<&str> = feed.posts.iter().map(|p| p.post.text.as_str()).collect();
        assert_eq!(texts, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_unknown_group_or_author_has_no_feed() {
        let (store, _, _) = seeded().await;
        let group = FeedScope::Group {
            slug: "missing".to_string(),
        };
        let author = FeedScope::Author {
            username: "nobody".to_string(),
            viewer: None,
        };
        assert!(store.read_feed(&group).await.unwrap().is_none());
        assert!(store.read_feed(&author).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let (store, leo, mia) = seeded().await;
        let leo_post = store.insert_post(new_post(&leo, "mine", None)).await.unwrap();
        let mia_post = store.insert_post(new_post(&mia, "hers", None)).await.unwrap();
        for post_id in [leo_post.id, mia_post.id] {
            store
                .insert_comment(NewComment {
                    post_id,
                    author_id: leo.id,
                    text: "hi".to_string(),
                })
                .await
                .unwrap();
        }
        store
            .insert_comment(NewComment {
                post_id: leo_post.id,
                author_id: mia.id,
                text: "hello".to_string(),
            })
            .await
            .unwrap();
        store.insert_follow(mia.id, leo.id).await.unwrap();
        store.insert_follow(leo.id, mia.id).await.unwrap();

        store.delete_user(leo.id).await.unwrap();

        assert!(store.find_post(leo_post.id).await.unwrap().is_none());
        let thread = store.read_post_thread(mia_post.id).await.unwrap().unwrap();
        assert!(thread.comments.is_empty());
        assert_eq!(store.count_follows().await.unwrap(), 0);
        assert!(store.tables.read().await.comments.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_group_keeps_posts() {
        let (store, leo, _) = seeded().await;
        let group = store
            .insert_group(NewGroup::new("News", "news", "").unwrap())
            .await
            .unwrap();
        let post = store
            .insert_post(new_post(&leo, "in group", Some(group.id)))
            .await
            .unwrap();

        store.delete_group(group.id).await.unwrap();

        let view = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(view.post.group_id, None);
        assert!(view.group.is_none());
    }

    #[tokio::test]
    async fn test_deleting_post_deletes_comments() {
        let (store, leo, mia) = seeded().await;
        let post = store.insert_post(new_post(&leo, "text", None)).await.unwrap();
        store
            .insert_comment(NewComment {
                post_id: post.id,
                author_id: mia.id,
                text: "nice".to_string(),
            })
            .await
            .unwrap();

        store.delete_post(post.id).await.unwrap();

        assert!(store.tables.read().await.comments.is_empty());
        assert!(matches!(
            store.delete_post(post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_follow_edges_are_unique_and_never_self() {
        let (store, leo, mia) = seeded().await;

        assert!(store.insert_follow(leo.id, mia.id).await.unwrap());
        assert!(!store.insert_follow(leo.id, mia.id).await.unwrap());
        assert!(matches!(
            store.insert_follow(leo.id, leo.id).await,
            Err(RepoError::Constraint(_))
        ));
        assert_eq!(store.count_follows().await.unwrap(), 1);

        assert!(store.delete_follow(leo.id, mia.id).await.unwrap());
        assert!(!store.delete_follow(leo.id, mia.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_followed_feed_only_has_followed_authors() {
        let (store, leo, mia) = seeded().await;
        let ann = store.insert_user(User::new("ann")).await.unwrap();
        store.insert_post(new_post(&mia, "from mia", None)).await.unwrap();
        store.insert_post(new_post(&ann, "from ann", None)).await.unwrap();
        store.insert_follow(leo.id, mia.id).await.unwrap();

        let feed = store
            .read_feed(&FeedScope::FollowedBy { follower: leo.id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].author.username, "mia");
    }

    #[tokio::test]
    async fn test_update_unknown_post() {
        let (store, _, _) = seeded().await;
        let changes = PostChanges {
            text: "x".to_string(),
            group_id: None,
            image: None,
        };
        assert!(matches!(
            store.update_post(42, changes).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _, _) = seeded().await;
        assert!(matches!(
            store.insert_user(User::new("leo")).await,
            Err(RepoError::Constraint(_))
        ));
    }
}
