use std::collections::BTreeMap;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AdminUser;
use crate::error::AppError;
use crate::models::Submission;
use crate::state::SharedState;
use crate::store::SubmissionId;
use crate::views::{field_label, format_timestamp, labeled_fields, LabeledField};

/// One dashboard table row, preprocessed for both the HTML partial and the
/// JSON listing.
#[derive(Debug, Clone, Serialize)]
pub struct AdminRow {
    pub id: String,
    pub kind: String,
    pub timestamp: String,
    pub fields: Vec<LabeledField>,
}

impl AdminRow {
    /// The text a reader sees in the row, used for search matching.
    fn rendered_text(&self) -> String {
        let mut text = format!("{} {}", self.kind, self.timestamp);
        for field in &self.fields {
            text.push(' ');
            text.push_str(&field.label);
            text.push(' ');
            text.push_str(&field.value);
        }
        text
    }
}

/// Rows for the full collection, newest first.
pub fn build_rows(all: &BTreeMap<SubmissionId, Submission>) -> Vec<AdminRow> {
    let mut records: Vec<(&SubmissionId, &Submission)> = all.iter().collect();
    records.sort_by(|(_, a), (_, b)| b.timestamp.cmp(&a.timestamp));

    records
        .into_iter()
        .map(|(id, record)| AdminRow {
            id: id.clone(),
            kind: record.kind.to_string(),
            timestamp: format_timestamp(&record.timestamp),
            fields: labeled_fields(&record.fields),
        })
        .collect()
}

/// Case-insensitive substring filter over each row's rendered text. Works on
/// the rows already in hand; storage is not queried again.
pub fn retain_matching(rows: &mut Vec<AdminRow>, query: &str) {
    let needle = query.trim().to_lowercase();
    rows.retain(|row| row.rendered_text().to_lowercase().contains(&needle));
}

#[derive(Template)]
#[template(path = "admin/submissions_table.html")]
struct SubmissionsTableTemplate {
    rows: Vec<AdminRow>,
    shown: usize,
    total: usize,
    search: String,
}

#[derive(Deserialize)]
pub struct TableParams {
    pub search: Option<String>,
}

pub async fn table_partial(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Query(params): Query<TableParams>,
) -> Result<Response, AppError> {
    // A failed dashboard load sends the browser back to the login prompt;
    // edit and delete failures surface as errors instead.
    let all = match state.store.read_all().await {
        Ok(all) => all,
        Err(e) => {
            tracing::error!("Dashboard list failed: {e}");
            return Ok(Redirect::to("/").into_response());
        }
    };
    let total = all.len();
    let search = params.search.unwrap_or_default();

    let mut rows = build_rows(&all);
    if !search.trim().is_empty() {
        retain_matching(&mut rows, &search);
    }

    let template = SubmissionsTableTemplate {
        shown: rows.len(),
        total,
        rows,
        search,
    };
    Ok(Html(template.render().unwrap_or_default()).into_response())
}

/// One editable input per stored field.
struct EditField {
    id: String,
    label: String,
    value: String,
}

#[derive(Template)]
#[template(path = "admin/edit_form.html")]
struct EditFormTemplate {
    id: String,
    kind: String,
    fields: Vec<EditField>,
}

pub async fn edit_partial(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .read_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let fields = record
        .fields
        .iter()
        .map(|(field_id, value)| EditField {
            id: field_id.clone(),
            label: field_label(field_id),
            value: value.clone(),
        })
        .collect();

    let template = EditFormTemplate {
        id,
        kind: record.kind.to_string(),
        fields,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubmissionKind;
    use chrono::{Duration, Utc};

    fn collection() -> BTreeMap<SubmissionId, Submission> {
        let mut all = BTreeMap::new();

        let mut fields = BTreeMap::new();
        fields.insert("fb-comments".to_string(), "Jane Doe was here".to_string());
        all.insert(
            "a".to_string(),
            Submission {
                kind: SubmissionKind::Feedback,
                timestamp: Utc::now() - Duration::minutes(10),
                fields,
            },
        );

        let mut fields = BTreeMap::new();
        fields.insert("survey-suggestions".to_string(), "faster load".to_string());
        all.insert(
            "b".to_string(),
            Submission {
                kind: SubmissionKind::Survey,
                timestamp: Utc::now(),
                fields,
            },
        );

        all
    }

    #[test]
    fn rows_are_newest_first() {
        let rows = build_rows(&collection());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[1].id, "a");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut rows = build_rows(&collection());
        retain_matching(&mut rows, "jane");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "a");
    }

    #[test]
    fn search_matches_labels_too() {
        let mut rows = build_rows(&collection());
        retain_matching(&mut rows, "suggestions");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "b");
    }

    #[test]
    fn search_without_match_hides_everything() {
        let mut rows = build_rows(&collection());
        retain_matching(&mut rows, "nobody");
        assert!(rows.is_empty());
    }
}
