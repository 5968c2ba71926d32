use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What produced a record. Admin overwrites lose the original kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionKind {
    Feedback,
    Survey,
    Edited,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Feedback => "Feedback",
            SubmissionKind::Survey => "Survey",
            SubmissionKind::Edited => "Edited",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored response. On the wire this is the flat map
/// `{"type": ..., "timestamp": ..., "<field>": "<value>", ...}`;
/// the id lives outside the record, assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "type")]
    pub kind: SubmissionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl Submission {
    /// Build a fresh record stamped with the current time.
    pub fn new(kind: SubmissionKind, fields: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            fields,
        }
    }
}
