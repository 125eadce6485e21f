//! HTTP handlers and route configuration.

mod feeds;
mod follows;
mod health;
mod posts;


use actix_web::http::header;
use actix_web::{HttpResponse, web};

use feedline_core::DomainError;
use feedline_core::view::Outcome;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Malformed ids in the path are unknown resources, not bad requests.
    cfg.app_data(web::PathConfig::default().error_handler(|err, req| {
        tracing::debug!(path = %req.path(), error = %err, "Unmatched path parameter");
        AppError::NotFound(req.path().to_string()).into()
    }))
    .route("/", web::get().to(feeds::index))
    .route("/group/{slug}/", web::get().to(feeds::group_posts))
    .route("/profile/{username}/", web::get().to(feeds::profile))
    .route("/profile/{username}/follow/", web::get().to(follows::profile_follow))
    .route("/profile/{username}/unfollow/", web::get().to(follows::profile_unfollow))
    .route("/follow/", web::get().to(feeds::follow_index))
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::create_form))
            .route(web::post().to(posts::create)),
    )
    .route("/posts/{post_id}/", web::get().to(posts::detail))
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::edit_form))
            .route(web::post().to(posts::edit)),
    )
    .route("/posts/{post_id}/delete/", web::post().to(posts::delete))
    .service(
        web::resource("/posts/{post_id}/comment/")
            .route(web::get().to(posts::comment_without_form))
            .route(web::post().to(posts::add_comment)),
    )
    .route("/health/", web::get().to(health::health_check))
    .default_service(web::to(not_found));
}

async fn not_found(req: actix_web::HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(req.path().to_string()))
}

/// Turn a service outcome into a response: 200 with the rendered view, or a
/// 302 to the target location.
pub(crate) fn respond(state: &AppState, outcome: Outcome) -> AppResult<HttpResponse> {
    match outcome {
        Outcome::Render(view) => {
            let body = state.renderer.render(&view).map_err(DomainError::from)?;
            Ok(HttpResponse::Ok()
                .content_type(state.renderer.content_type())
                .body(body))
        }
        Outcome::Redirect(location) => Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, location))
            .finish()),
    }
}
