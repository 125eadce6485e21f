//! Identity extraction from tokens issued by the authentication provider.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use feedline_core::authz::{Actor, Principal};
use feedline_core::ports::AuthError;

use crate::state::AppState;

/// Cookie carrying the identity token for browser clients.
pub const TOKEN_COOKIE: &str = "access_token";

/// The acting identity of a request. Never fails: a missing, expired or
/// invalid token is an anonymous actor, and guards decide what that means.
///
/// ```ignore
/// async fn handler(CurrentIdentity(actor): CurrentIdentity) -> impl Responder { .. }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Actor);

/// `Authorization: Bearer <token>` first, then the token cookie.
fn extract_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()));
    }

    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingAuth)
}

impl FromRequest for CurrentIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState not found in app data");
            return ready(Ok(CurrentIdentity(Actor::Anonymous)));
        };

        let actor = match extract_token(req).and_then(|token| state.tokens.validate_token(&token)) {
            Ok(claims) => Actor::from(Principal::from(claims)),
            Err(AuthError::MissingAuth) => Actor::Anonymous,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable identity token");
                Actor::Anonymous
            }
        };

        ready(Ok(CurrentIdentity(actor)))
    }
}
