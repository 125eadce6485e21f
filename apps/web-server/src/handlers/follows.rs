use actix_web::{HttpResponse, web};

use crate::middleware::auth::CurrentIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

use super::respond;

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.follow(&actor, &path).await?;
    respond(&state, outcome)
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    CurrentIdentity(actor): CurrentIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.mutations.unfollow(&actor, &path).await?;
    respond(&state, outcome)
}
