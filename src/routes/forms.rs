use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::AppError;
use crate::forms::progress::Progress;
use crate::forms::{collect, parser, FormKind};
use crate::state::SharedState;

fn form_kind(name: &str) -> Result<FormKind, AppError> {
    FormKind::parse(name).ok_or_else(|| AppError::NotFound(format!("No such form: {name}")))
}

fn parse_answers(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<std::collections::BTreeMap<String, String>, AppError> {
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());
    parser::parse_body(content_type, body).map_err(AppError::BadRequest)
}

/// Public intake: validate the posted answers and store one record.
pub async fn submit(
    State(state): State<SharedState>,
    Path(form): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let form = form_kind(&form)?;
    let answers = parse_answers(&headers, &body)?;

    let record = collect::collect(
        form,
        &answers,
        state.config.validation,
        state.config.required_override(form),
    )
    .map_err(|e| AppError::Validation(e.to_string()))?;

    // A failed create must not advance the client to the summary, so the
    // response only carries a summary location on success.
    let id = state.store.create(&record).await?;

    tracing::info!("Stored {} submission {id}", form.name());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "id": id,
            "summary_url": format!("/summary/{id}"),
        })),
    )
        .into_response())
}

/// Completion readout for a partially filled form.
pub async fn progress(
    State(state): State<SharedState>,
    Path(form): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Progress>, AppError> {
    let form = form_kind(&form)?;
    let answers = parse_answers(&headers, &body)?;

    Ok(Json(crate::forms::progress::compute(
        form,
        &answers,
        state.config.required_override(form),
    )))
}

/// CORS preflight for forms posted from pages hosted elsewhere.
pub async fn submit_options() -> Response {
    (
        [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Access-Control-Max-Age", "86400"),
        ],
        StatusCode::NO_CONTENT,
    )
        .into_response()
}
