pub mod admin;
pub mod summary;

use axum::routing::get;
use axum::Router;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/summary/{id}", get(summary::show))
        // HTMX partials
        .route("/htmx/submissions", get(admin::table_partial))
        .route("/htmx/submissions/{id}/edit", get(admin::edit_partial))
}

/// A field ready for display: human label next to the raw stored value.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledField {
    pub label: String,
    pub value: String,
}

/// Derive a display label from a field id: strip the form-section prefix,
/// swap separators for spaces, title-case the words.
pub fn field_label(id: &str) -> String {
    let stripped = id
        .strip_prefix("fb-")
        .or_else(|| id.strip_prefix("survey-"))
        .unwrap_or(id);

    stripped
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable rendering of a stored timestamp.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// A record's fields as label/value pairs, in stored (alphabetical) order.
pub fn labeled_fields(fields: &std::collections::BTreeMap<String, String>) -> Vec<LabeledField> {
    fields
        .iter()
        .map(|(id, value)| LabeledField {
            label: field_label(id),
            value: value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_title_cases() {
        assert_eq!(field_label("fb-satisfaction"), "Satisfaction");
        assert_eq!(field_label("survey-hear-other"), "Hear Other");
        assert_eq!(field_label("free_text_notes"), "Free Text Notes");
    }

    #[test]
    fn unprefixed_ids_pass_through() {
        assert_eq!(field_label("comments"), "Comments");
    }

    #[test]
    fn timestamp_is_localized() {
        let ts: DateTime<Utc> = "2024-05-01T12:30:45Z".parse().unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-01 12:30:45 UTC");
    }
}
