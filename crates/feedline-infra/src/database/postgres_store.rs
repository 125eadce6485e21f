//! PostgreSQL entity store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbConn, DbErr,
    EntityTrait, IntoActiveModel, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use feedline_core::domain::{
    AuthorRef, Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges,
    PostView, User,
};
use feedline_core::error::RepoError;
use feedline_core::ports::{EntityStore, FeedAnchor, FeedScope, FeedSnapshot, PostThread};

use super::entity::{comment, follow, group, post, user};

fn map_db_err(e: DbErr) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg))
        | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => RepoError::Constraint(msg),
        _ => match e {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(e.to_string()),
            _ => RepoError::Query(e.to_string()),
        },
    }
}

fn author_ref(model: user::Model) -> AuthorRef {
    AuthorRef {
        id: model.id,
        username: model.username,
    }
}

/// Load posts with their group and author, newest first.
async fn load_post_views<C: ConnectionTrait>(
    conn: &C,
    select: Select<post::Entity>,
) -> Result<Vec<PostView>, RepoError> {
    let rows = select
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .find_also_related(group::Entity)
        .all(conn)
        .await
        .map_err(map_db_err)?;

    let author_ids: HashSet<Uuid> = rows.iter().map(|(post, _)| post.author_id).collect();
    let authors: HashMap<Uuid, AuthorRef> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(conn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|model| (model.id, author_ref(model)))
            .collect()
    };

    rows.into_iter()
        .map(|(post, group)| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;
            Ok(PostView {
                post: post.into(),
                author,
                group: group.map(Into::into),
            })
        })
        .collect()
}

async fn read_snapshot<C: ConnectionTrait>(
    conn: &C,
    scope: &FeedScope,
) -> Result<Option<FeedSnapshot>, RepoError> {
    let snapshot = match scope {
        FeedScope::All => FeedSnapshot {
            anchor: FeedAnchor::None,
            posts: load_post_views(conn, post::Entity::find()).await?,
        },
        FeedScope::Group { slug } => {
            let Some(group) = group::Entity::find()
                .filter(group::Column::Slug.eq(slug.as_str()))
                .one(conn)
                .await
                .map_err(map_db_err)?
            else {
                return Ok(None);
            };
            let posts = load_post_views(
                conn,
                post::Entity::find().filter(post::Column::GroupId.eq(group.id)),
            )
            .await?;
            FeedSnapshot {
                anchor: FeedAnchor::Group(group.into()),
                posts,
            }
        }
        FeedScope::Author { username, viewer } => {
            let Some(author) = user::Entity::find()
                .filter(user::Column::Username.eq(username.as_str()))
                .one(conn)
                .await
                .map_err(map_db_err)?
            else {
                return Ok(None);
            };
            let followed_by_viewer = match viewer {
                Some(viewer) => {
                    follow::Entity::find()
                        .filter(follow::Column::FollowerId.eq(*viewer))
                        .filter(follow::Column::FollowedId.eq(author.id))
                        .count(conn)
                        .await
                        .map_err(map_db_err)?
                        > 0
                }
                None => false,
            };
            let posts = load_post_views(
                conn,
                post::Entity::find().filter(post::Column::AuthorId.eq(author.id)),
            )
            .await?;
            FeedSnapshot {
                anchor: FeedAnchor::Author {
                    author: author.into(),
                    followed_by_viewer,
                },
                posts,
            }
        }
        FeedScope::FollowedBy { follower } => {
            let followed = Query::select()
                .column(follow::Column::FollowedId)
                .from(follow::Entity)
                .and_where(follow::Column::FollowerId.eq(*follower))
                .to_owned();
            let posts = load_post_views(
                conn,
                post::Entity::find().filter(post::Column::AuthorId.in_subquery(followed)),
            )
            .await?;
            FeedSnapshot {
                anchor: FeedAnchor::None,
                posts,
            }
        }
    };

    Ok(Some(snapshot))
}

/// Edit a stored post in place. The image only changes when a new one is given.
pub(super) fn apply_changes(current: post::Model, changes: PostChanges) -> post::ActiveModel {
    let mut active = current.into_active_model();
    active.text = Set(changes.text);
    active.group_id = Set(changes.group_id);
    if let Some(image) = changes.image {
        active.image = Set(Some(image));
    }
    active
}

/// Entity store backed by PostgreSQL. Multi-statement operations run in one
/// transaction; feed reads use a read-only repeatable-read snapshot.
pub struct PostgresEntityStore {
    db: DbConn,
}

impl PostgresEntityStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(Into::into))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(Into::into))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let own_posts = Query::select()
            .column(post::Column::Id)
            .from(post::Entity)
            .and_where(post::Column::AuthorId.eq(id))
            .to_owned();
        comment::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(comment::Column::AuthorId.eq(id))
                    .add(comment::Column::PostId.in_subquery(own_posts)),
            )
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        post::Entity::delete_many()
            .filter(post::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        follow::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(follow::Column::FollowerId.eq(id))
                    .add(follow::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let result = user::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }
        txn.commit().await.map_err(map_db_err)
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RepoError> {
        let model = group::ActiveModel {
            title: Set(group.title),
            slug: Set(group.slug),
            description: Set(group.description),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, RepoError> {
        let model = group::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepoError> {
        let models = group::Entity::find()
            .order_by_asc(group::Column::Title)
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_group(&self, id: i64) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        post::Entity::update_many()
            .col_expr(post::Column::GroupId, Expr::value(Option::<i64>::None))
            .filter(post::Column::GroupId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let result = group::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }
        txn.commit().await.map_err(map_db_err)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            text: Set(post.text),
            created_at: Set(Utc::now().into()),
            author_id: Set(post.author_id),
            group_id: Set(post.group_id),
            image: Set(post.image),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let current = post::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let model = apply_changes(current, changes)
            .update(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        comment::Entity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let result = post::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }
        txn.commit().await.map_err(map_db_err)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostView>, RepoError> {
        let mut posts = load_post_views(&self.db, post::Entity::find_by_id(id)).await?;
        Ok(posts.pop())
    }

    async fn read_post_thread(&self, id: i64) -> Result<Option<PostThread>, RepoError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await
            .map_err(map_db_err)?;

        let Some(post) = load_post_views(&txn, post::Entity::find_by_id(id)).await?.pop() else {
            txn.commit().await.map_err(map_db_err)?;
            return Ok(None);
        };

        let comments = comment::Entity::find()
            .filter(comment::Column::PostId.eq(id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .find_also_related(user::Entity)
            .all(&txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|(comment, author)| {
                let author = author
                    .map(author_ref)
                    .ok_or_else(|| RepoError::Query(format!("comment {} has no author", comment.id)))?;
                Ok(CommentView {
                    comment: comment.into(),
                    author,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(Some(PostThread { post, comments }))
    }

    async fn read_feed(&self, scope: &FeedScope) -> Result<Option<FeedSnapshot>, RepoError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await
            .map_err(map_db_err)?;

        let snapshot = read_snapshot(&txn, scope).await?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(snapshot)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            post_id: Set(comment.post_id),
            author_id: Set(comment.author_id),
            text: Set(comment.text),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn insert_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        if follower == followed {
            return Err(RepoError::Constraint("users cannot follow themselves".to_string()));
        }

        let edge = follow::ActiveModel {
            follower_id: Set(follower),
            followed_id: Set(followed),
            ..Default::default()
        };
        let inserted = follow::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(inserted > 0)
    }

    async fn delete_follow(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        let result = follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower))
            .filter(follow::Column::FollowedId.eq(followed))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        let count = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(follower))
            .filter(follow::Column::FollowedId.eq(followed))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(count > 0)
    }

    async fn count_follows(&self) -> Result<u64, RepoError> {
        follow::Entity::find()
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
