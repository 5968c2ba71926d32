use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};

use crate::error::AppError;
use crate::state::SharedState;
use crate::views::{format_timestamp, labeled_fields, LabeledField};

#[derive(Template)]
#[template(path = "summary.html")]
struct SummaryTemplate {
    kind: String,
    timestamp: String,
    fields: Vec<LabeledField>,
}

/// Post-submit confirmation view for one stored record.
pub async fn show(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .read_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let template = SummaryTemplate {
        kind: record.kind.to_string(),
        timestamp: format_timestamp(&record.timestamp),
        fields: labeled_fields(&record.fields),
    };
    Ok(Html(template.render().unwrap_or_default()))
}
