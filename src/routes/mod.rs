pub mod admin;
pub mod forms;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Admin console
        .route("/api/v1/admin/login", post(admin::login))
        .route("/api/v1/admin/logout", post(admin::logout))
        .route("/api/v1/admin/submissions", get(admin::list))
        .route("/api/v1/admin/submissions/events", get(admin::events))
        .route(
            "/api/v1/admin/submissions/{id}",
            get(admin::get).put(admin::update).delete(admin::delete),
        )
}

pub fn ingest_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/v1/f/{form}",
            post(forms::submit).options(forms::submit_options),
        )
        .route("/v1/f/{form}/progress", post(forms::progress))
}
