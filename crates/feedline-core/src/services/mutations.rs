//! Write-side service. Every mutation walks the same path: authorize,
//! validate, persist, invalidate the global feed cache, redirect.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::authz::{self, Access, Actor};
use crate::domain::{Group, NewComment, NewPost, PostChanges, PostView, User};
use crate::error::DomainError;
use crate::feed_cache::GlobalFeedCache;
use crate::forms::{BoundForm, CommentInput, PostInput};
use crate::ports::EntityStore;
use crate::view::{Outcome, paths, templates};

pub struct MutationService {
    store: Arc<dyn EntityStore>,
    cache: GlobalFeedCache,
    login_url: String,
}

impl MutationService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: GlobalFeedCache,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            login_url: login_url.into(),
        }
    }

    /// Empty post form.
    pub async fn create_post_form(&self, actor: &Actor) -> Result<Outcome, DomainError> {
        if !authz::can_create_post(actor).is_granted() {
            return Ok(self.login_redirect(&paths::post_create()));
        }
        let groups = self.store.list_groups().await?;
        Ok(post_form(BoundForm::unbound(PostInput::default()), groups, None))
    }

    pub async fn create_post(&self, actor: &Actor, input: PostInput) -> Result<Outcome, DomainError> {
        let Some(author) = self.acting_user(actor).await? else {
            return Ok(self.login_redirect(&paths::post_create()));
        };

        let groups = self.store.list_groups().await?;
        let clean = match input.clean(&groups) {
            Ok(clean) => clean,
            Err(errors) => {
                return Ok(post_form(BoundForm::with_errors(input, errors), groups, None));
            }
        };

        let post = self
            .store
            .insert_post(NewPost {
                text: clean.text,
                author_id: author.id,
                group_id: clean.group_id,
                image: clean.image,
            })
            .await?;
        self.cache.invalidate().await?;

        tracing::info!(post_id = post.id, author = %author.username, "Post created");
        Ok(Outcome::redirect(paths::profile(&author.username)))
    }

    /// Post form pre-filled with the current values.
    pub async fn edit_post_form(&self, actor: &Actor, post_id: i64) -> Result<Outcome, DomainError> {
        let post = match self.editable_post(actor, post_id).await? {
            Ok(post) => post,
            Err(outcome) => return Ok(outcome),
        };
        let groups = self.store.list_groups().await?;
        let form = BoundForm::unbound(PostInput::from_post(&post.post));
        Ok(post_form(form, groups, Some(&post)))
    }

    pub async fn edit_post(
        &self,
        actor: &Actor,
        post_id: i64,
        input: PostInput,
    ) -> Result<Outcome, DomainError> {
        let post = match self.editable_post(actor, post_id).await? {
            Ok(post) => post,
            Err(outcome) => return Ok(outcome),
        };

        let groups = self.store.list_groups().await?;
        let clean = match input.clean(&groups) {
            Ok(clean) => clean,
            Err(errors) => {
                return Ok(post_form(
                    BoundForm::with_errors(input, errors),
                    groups,
                    Some(&post),
                ));
            }
        };

        self.store
            .update_post(
                post_id,
                PostChanges {
                    text: clean.text,
                    group_id: clean.group_id,
                    image: clean.image,
                },
            )
            .await?;
        self.cache.invalidate().await?;

        tracing::info!(post_id, "Post edited");
        Ok(Outcome::redirect(paths::post_detail(post_id)))
    }

    pub async fn delete_post(&self, actor: &Actor, post_id: i64) -> Result<Outcome, DomainError> {
        if actor.is_anonymous() {
            return Ok(self.login_redirect(&paths::post_delete(post_id)));
        }
        let post = self.find_post(post_id).await?;

        match authz::can_delete_post(actor, &post.post) {
            Access::Granted => {}
            Access::LoginRequired => return Ok(self.login_redirect(&paths::post_delete(post_id))),
            _ => return Ok(Outcome::redirect(paths::post_detail(post_id))),
        }

        self.store.delete_post(post_id).await?;
        self.cache.invalidate().await?;

        tracing::info!(post_id, "Post deleted");
        Ok(Outcome::redirect(paths::profile(&post.author.username)))
    }

    /// Attach a comment to a post. Always ends on the post detail page; an
    /// invalid or missing form is dropped without a message.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: i64,
        input: Option<CommentInput>,
    ) -> Result<Outcome, DomainError> {
        if !authz::can_comment(actor).is_granted() {
            return Ok(self.login_redirect(&paths::post_comment(post_id)));
        }
        let Some(author) = self.acting_user(actor).await? else {
            return Ok(self.login_redirect(&paths::post_comment(post_id)));
        };
        self.find_post(post_id).await?;

        match input.unwrap_or_default().clean() {
            Ok(text) => {
                let comment = self
                    .store
                    .insert_comment(NewComment {
                        post_id,
                        author_id: author.id,
                        text,
                    })
                    .await?;
                tracing::info!(post_id, comment_id = comment.id, "Comment added");
            }
            Err(errors) => {
                tracing::debug!(post_id, errors = ?errors, "Comment rejected");
            }
        }

        Ok(Outcome::redirect(paths::post_detail(post_id)))
    }

    /// Follow `username`. Self-follows and repeats change nothing.
    pub async fn follow(&self, actor: &Actor, username: &str) -> Result<Outcome, DomainError> {
        let Some(follower) = self.acting_user(actor).await? else {
            return Ok(self.login_redirect(&paths::profile_follow(username)));
        };
        let target = self.find_author(username).await?;

        let already = self.store.is_following(follower.id, target.id).await?;
        match authz::can_follow(actor, &target, already) {
            Access::Granted => {
                if self.store.insert_follow(follower.id, target.id).await? {
                    tracing::info!(follower = %follower.username, followed = %target.username, "Follow created");
                }
            }
            Access::LoginRequired => {
                return Ok(self.login_redirect(&paths::profile_follow(username)));
            }
            refused => {
                tracing::debug!(follower = %follower.username, followed = %target.username, access = ?refused, "Follow ignored");
            }
        }

        Ok(Outcome::redirect(paths::profile(&target.username)))
    }

    /// Remove the follow edge to `username`, if any.
    pub async fn unfollow(&self, actor: &Actor, username: &str) -> Result<Outcome, DomainError> {
        let Some(follower) = self.acting_user(actor).await? else {
            return Ok(self.login_redirect(&paths::profile_unfollow(username)));
        };
        let target = self.find_author(username).await?;

        if self.store.delete_follow(follower.id, target.id).await? {
            tracing::info!(follower = %follower.username, followed = %target.username, "Follow removed");
        }

        Ok(Outcome::redirect(paths::profile(&target.username)))
    }

    /// Administrative removal of a group. Its posts stay, ungrouped.
    pub async fn remove_group(&self, group_id: i64) -> Result<(), DomainError> {
        if self.store.find_group(group_id).await?.is_none() {
            return Err(DomainError::not_found("Group", group_id));
        }
        self.store.delete_group(group_id).await?;
        self.cache.invalidate().await?;

        tracing::info!(group_id, "Group removed");
        Ok(())
    }

    /// Administrative removal of an author and everything they own.
    pub async fn remove_author(&self, user_id: Uuid) -> Result<(), DomainError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(DomainError::not_found("User", user_id));
        }
        self.store.delete_user(user_id).await?;
        self.cache.invalidate().await?;

        tracing::info!(%user_id, "Author removed");
        Ok(())
    }

    /// The stored user behind an authenticated actor. A principal whose user
    /// record is gone is treated like an anonymous one.
    async fn acting_user(&self, actor: &Actor) -> Result<Option<User>, DomainError> {
        let Some(user_id) = actor.user_id() else {
            return Ok(None);
        };
        let user = self.store.find_user(user_id).await?;
        if user.is_none() {
            tracing::warn!(%user_id, "Authenticated principal has no user record");
        }
        Ok(user)
    }

    /// The post `actor` may edit, or the outcome to return instead.
    async fn editable_post(
        &self,
        actor: &Actor,
        post_id: i64,
    ) -> Result<Result<PostView, Outcome>, DomainError> {
        if actor.is_anonymous() {
            return Ok(Err(self.login_redirect(&paths::post_edit(post_id))));
        }
        let post = self.find_post(post_id).await?;

        Ok(match authz::can_edit_post(actor, &post.post) {
            Access::Granted => Ok(post),
            Access::LoginRequired => Err(self.login_redirect(&paths::post_edit(post_id))),
            _ => Err(Outcome::redirect(paths::post_detail(post_id))),
        })
    }

    async fn find_post(&self, post_id: i64) -> Result<PostView, DomainError> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    fn login_redirect(&self, next: &str) -> Outcome {
        Outcome::redirect(paths::login(&self.login_url, next))
    }
}

fn post_form(form: BoundForm<PostInput>, groups: Vec<Group>, post: Option<&PostView>) -> Outcome {
    let mut context = json!({
        "form": form,
        "groups": groups,
        "is_edit": post.is_some(),
    });
    if let Some(post) = post {
        context["post"] = json!(post);
    }
    Outcome::render(templates::POST_FORM, context)
}
