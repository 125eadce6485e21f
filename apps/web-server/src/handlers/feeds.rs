//! Feed pages: global, group, profile and followed authors.

use actix_web::{HttpResponse, web};

use feedline_shared::dto::PageQuery;

use crate::middleware::auth::CurrentIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::respond;

/// Header reporting whether the global feed came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-feed-cache";

/// GET /
pub async fn index(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let page = state.reads.index(query.page()).await?;

    Ok(HttpResponse::Ok()
        .content_type(state.renderer.content_type())
        .insert_header((CACHE_STATUS_HEADER, if page.from_cache { "hit" } else { "miss" }))
        .body(page.body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let outcome = state.reads.group_posts(&path, query.page()).await?;
    respond(&state, outcome)
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let outcome = state.reads.profile(&actor, &path, query.page()).await?;
    respond(&state, outcome)
}

/// GET /follow/
pub async fn follow_index(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let outcome = state.reads.follow_index(&actor, query.page()).await?;
    respond(&state, outcome)
}
