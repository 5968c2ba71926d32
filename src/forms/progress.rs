use std::collections::BTreeMap;

use serde::Serialize;

use crate::forms::{collect, FormKind};

/// Per-form completion, as shown next to the form's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Count filled fields against the form's current target. Choice answers
/// outside their option set do not count, and a conditional field joins the
/// total only while its trigger is selected.
pub fn compute(
    form: FormKind,
    answers: &BTreeMap<String, String>,
    required_override: Option<usize>,
) -> Progress {
    let gathered = collect::gather(form, answers);
    let completed = gathered.fields.len();
    let total = required_override.unwrap_or(gathered.active_total).max(1);

    Progress {
        completed,
        total,
        percent: (completed * 100 / total).min(100) as u8,
    }
}
