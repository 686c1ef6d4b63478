//! Profiles-related HTTP API.

pub mod create;

use axum::Router;
use axum::routing::post;

use crate::AppState;

pub(super) const BEARER: &str = "Bearer ";

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /users/:ID/profile` goes to `create`.
        .route("/{user_id}/profile", post(create::handler))
}
