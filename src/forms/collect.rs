use std::collections::BTreeMap;

use crate::forms::{FieldKind, FormKind};
use crate::models::Submission;

/// How strict the completeness gate is. Advisory only: nothing re-checks on
/// the stored side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Every active target field must be filled.
    RequireAll,
    /// More than zero fields is enough.
    AtLeastOne,
}

impl ValidationPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(ValidationPolicy::RequireAll),
            "any" => Some(ValidationPolicy::AtLeastOne),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("Please fill out the {form} form ({filled} of {required} fields completed).")]
    Incomplete {
        form: &'static str,
        filled: usize,
        required: usize,
    },
    #[error("Please fill out the {form} form.")]
    Empty { form: &'static str },
    #[error("'{value}' is not an option for {field}")]
    UnknownChoice { field: String, value: String },
}

/// Answers matched against the schema: what was filled, how many fields are
/// currently in play, and choice answers outside their option set.
pub struct Gathered {
    pub fields: BTreeMap<String, String>,
    pub active_total: usize,
    pub rejected: Vec<(String, String)>,
}

/// Walk the form's schema over the raw answers. Takes every answered choice
/// field and every non-empty trimmed text field; a conditional text field
/// participates only while its trigger option is selected. Keys the schema
/// does not know are dropped.
pub fn gather(form: FormKind, answers: &BTreeMap<String, String>) -> Gathered {
    let mut fields = BTreeMap::new();
    let mut rejected = Vec::new();
    let mut active_total = 0;

    for def in form.schema() {
        if !def.is_active(answers) {
            continue;
        }
        active_total += 1;

        let Some(raw) = answers.get(def.id) else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }

        match def.kind {
            FieldKind::Choice(options) => {
                if options.contains(&value) {
                    fields.insert(def.id.to_string(), value.to_string());
                } else {
                    rejected.push((def.id.to_string(), value.to_string()));
                }
            }
            FieldKind::Text | FieldKind::ConditionalText { .. } => {
                fields.insert(def.id.to_string(), value.to_string());
            }
        }
    }

    let known: std::collections::BTreeSet<&str> =
        form.schema().iter().map(|def| def.id).collect();
    for key in answers.keys() {
        if !known.contains(key.as_str()) {
            tracing::debug!("Ignoring unknown {} field: {key}", form.name());
        }
    }

    Gathered {
        fields,
        active_total,
        rejected,
    }
}

/// Validate the answers and build the record to store. The caller owns
/// storage and failure reporting.
pub fn collect(
    form: FormKind,
    answers: &BTreeMap<String, String>,
    policy: ValidationPolicy,
    required_override: Option<usize>,
) -> Result<Submission, CollectError> {
    let gathered = gather(form, answers);

    if let Some((field, value)) = gathered.rejected.into_iter().next() {
        return Err(CollectError::UnknownChoice { field, value });
    }

    let required = required_override.unwrap_or(gathered.active_total);
    match policy {
        ValidationPolicy::RequireAll => {
            if gathered.fields.len() < required {
                return Err(CollectError::Incomplete {
                    form: form.name(),
                    filled: gathered.fields.len(),
                    required,
                });
            }
        }
        ValidationPolicy::AtLeastOne => {
            if gathered.fields.is_empty() {
                return Err(CollectError::Empty { form: form.name() });
            }
        }
    }

    Ok(Submission::new(form.submission_kind(), gathered.fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubmissionKind;

    fn full_feedback() -> BTreeMap<String, String> {
        [
            ("fb-satisfaction", "Good"),
            ("fb-ease", "Easy"),
            ("fb-speed", "Fast"),
            ("fb-design", "Excellent"),
            ("fb-support", "Fair"),
            ("fb-value", "Good"),
            ("fb-recommend", "Definitely"),
            ("fb-return", "Yes"),
            ("fb-liked", "the speed"),
            ("fb-improve", "more themes"),
            ("fb-comments", "keep it up"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn full_feedback_passes_require_all() {
        let record = collect(
            FormKind::Feedback,
            &full_feedback(),
            ValidationPolicy::RequireAll,
            None,
        )
        .unwrap();

        assert_eq!(record.kind, SubmissionKind::Feedback);
        assert_eq!(record.fields.len(), 11);
    }

    #[test]
    fn one_field_rejected_under_require_all() {
        let mut answers = BTreeMap::new();
        answers.insert("fb-satisfaction".to_string(), "Good".to_string());
        answers.insert("fb-comments".to_string(), "".to_string());

        let err = collect(
            FormKind::Feedback,
            &answers,
            ValidationPolicy::RequireAll,
            None,
        )
        .unwrap_err();

        match err {
            CollectError::Incomplete {
                form,
                filled,
                required,
            } => {
                assert_eq!(form, "feedback");
                assert_eq!(filled, 1);
                assert_eq!(required, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn one_field_passes_at_least_one() {
        let mut answers = BTreeMap::new();
        answers.insert("fb-satisfaction".to_string(), "Good".to_string());

        let record = collect(
            FormKind::Feedback,
            &answers,
            ValidationPolicy::AtLeastOne,
            None,
        )
        .unwrap();
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn empty_rejected_under_both_policies() {
        let answers = BTreeMap::new();
        assert!(collect(
            FormKind::Survey,
            &answers,
            ValidationPolicy::RequireAll,
            None
        )
        .is_err());
        assert!(collect(
            FormKind::Survey,
            &answers,
            ValidationPolicy::AtLeastOne,
            None
        )
        .is_err());
    }

    #[test]
    fn choice_outside_options_is_rejected() {
        let mut answers = BTreeMap::new();
        answers.insert("fb-satisfaction".to_string(), "Stellar".to_string());

        let err = collect(
            FormKind::Feedback,
            &answers,
            ValidationPolicy::AtLeastOne,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::UnknownChoice { .. }));
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let mut answers = BTreeMap::new();
        answers.insert("fb-satisfaction".to_string(), "Good".to_string());
        answers.insert("hidden-tracker".to_string(), "x".to_string());

        let record = collect(
            FormKind::Feedback,
            &answers,
            ValidationPolicy::AtLeastOne,
            None,
        )
        .unwrap();
        assert!(!record.fields.contains_key("hidden-tracker"));
    }

    #[test]
    fn inactive_conditional_is_not_required() {
        // Survey without "Other": 17 active fields.
        let answers: BTreeMap<String, String> = [
            ("survey-age", "25-34"),
            ("survey-gender", "Female"),
            ("survey-role", "Employed"),
            ("survey-hear", "Friend"),
            ("survey-usage", "Both"),
            ("survey-frequency", "Daily"),
            ("survey-device", "Laptop"),
            ("survey-browser", "Firefox"),
            ("survey-performance", "Good"),
            ("survey-reliability", "Excellent"),
            ("survey-design", "Good"),
            ("survey-pricing", "Fair"),
            ("survey-support", "Good"),
            ("survey-recommend", "Probably"),
            ("survey-liked", "search"),
            ("survey-missing", "exports"),
            ("survey-suggestions", "none"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let record = collect(
            FormKind::Survey,
            &answers,
            ValidationPolicy::RequireAll,
            None,
        )
        .unwrap();
        assert_eq!(record.fields.len(), 17);
        assert!(!record.fields.contains_key("survey-hear-other"));
    }

    #[test]
    fn active_conditional_is_required() {
        let mut answers = BTreeMap::new();
        answers.insert("survey-hear".to_string(), "Other".to_string());

        let err = collect(
            FormKind::Survey,
            &answers,
            ValidationPolicy::RequireAll,
            None,
        )
        .unwrap_err();
        match err {
            CollectError::Incomplete { required, .. } => assert_eq!(required, 18),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn required_override_takes_precedence() {
        let mut answers = BTreeMap::new();
        answers.insert("fb-satisfaction".to_string(), "Good".to_string());

        let record = collect(
            FormKind::Feedback,
            &answers,
            ValidationPolicy::RequireAll,
            Some(1),
        )
        .unwrap();
        assert_eq!(record.fields.len(), 1);
    }
}
