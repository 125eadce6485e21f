//! Post detail and the post/comment mutation routes.

use actix_web::{HttpResponse, web};

use feedline_core::forms::{CommentInput, PostInput};

use crate::middleware::auth::CurrentIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::respond;

/// An unreadable body is an empty submission, so it fails validation.
fn submitted(form: Option<web::Form<PostInput>>) -> PostInput {
    form.map(web::Form::into_inner).unwrap_or_default()
}

/// GET /posts/{post_id}/
pub async fn detail(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let outcome = state.reads.post_detail(path.into_inner()).await?;
    respond(&state, outcome)
}

/// GET /create/
pub async fn create_form(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.create_post_form(&actor).await?;
    respond(&state, outcome)
}

/// POST /create/
pub async fn create(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    form: Option<web::Form<PostInput>>,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.create_post(&actor, submitted(form)).await?;
    respond(&state, outcome)
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.edit_post_form(&actor, path.into_inner()).await?;
    respond(&state, outcome)
}

/// POST /posts/{post_id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<i64>,
    form: Option<web::Form<PostInput>>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .mutations
        .edit_post(&actor, path.into_inner(), submitted(form))
        .await?;
    respond(&state, outcome)
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.delete_post(&actor, path.into_inner()).await?;
    respond(&state, outcome)
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<i64>,
    form: Option<web::Form<CommentInput>>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .mutations
        .add_comment(&actor, path.into_inner(), form.map(web::Form::into_inner))
        .await?;
    respond(&state, outcome)
}

/// GET /posts/{post_id}/comment/ - nothing to save, back to the post.
pub async fn comment_without_form(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .mutations
        .add_comment(&actor, path.into_inner(), None)
        .await?;
    respond(&state, outcome)
}
