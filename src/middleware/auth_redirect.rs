use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

/// Middleware for browser-facing partials: a 401 (missing/expired session,
/// or a dashboard load that failed authorization) sends the client back to
/// the login prompt at `/` instead of surfacing raw JSON.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::UNAUTHORIZED {
        Redirect::to("/").into_response()
    } else {
        response
    }
}
