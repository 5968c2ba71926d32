pub mod collect;
pub mod parser;
pub mod progress;

use crate::models::SubmissionKind;

/// The two public intake forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Feedback,
    Survey,
}

impl FormKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feedback" => Some(FormKind::Feedback),
            "survey" => Some(FormKind::Survey),
            _ => None,
        }
    }

    /// Lowercase name used in URLs and validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            FormKind::Feedback => "feedback",
            FormKind::Survey => "survey",
        }
    }

    pub fn submission_kind(&self) -> SubmissionKind {
        match self {
            FormKind::Feedback => SubmissionKind::Feedback,
            FormKind::Survey => SubmissionKind::Survey,
        }
    }

    pub fn schema(&self) -> &'static [FieldDef] {
        match self {
            FormKind::Feedback => FEEDBACK_FIELDS,
            FormKind::Survey => SURVEY_FIELDS,
        }
    }
}

/// One field of a form, identified by the name its input carries.
pub struct FieldDef {
    pub id: &'static str,
    pub kind: FieldKind,
}

pub enum FieldKind {
    /// Single choice among a fixed option set.
    Choice(&'static [&'static str]),
    /// Free text.
    Text,
    /// Free text that participates only while `trigger` holds `value`.
    ConditionalText {
        trigger: &'static str,
        value: &'static str,
    },
}

impl FieldDef {
    const fn choice(id: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            id,
            kind: FieldKind::Choice(options),
        }
    }

    const fn text(id: &'static str) -> Self {
        Self {
            id,
            kind: FieldKind::Text,
        }
    }

    /// Whether the field counts toward completion, given the current answers.
    pub fn is_active(&self, answers: &std::collections::BTreeMap<String, String>) -> bool {
        match self.kind {
            FieldKind::ConditionalText { trigger, value } => answers
                .get(trigger)
                .is_some_and(|picked| picked.trim() == value),
            _ => true,
        }
    }
}

const RATING: &[&str] = &["Excellent", "Good", "Fair", "Poor"];
const AGREEMENT: &[&str] = &["Definitely", "Probably", "Not Sure", "No"];

static FEEDBACK_FIELDS: &[FieldDef] = &[
    FieldDef::choice("fb-satisfaction", RATING),
    FieldDef::choice("fb-ease", &["Very Easy", "Easy", "Difficult", "Very Difficult"]),
    FieldDef::choice("fb-speed", &["Very Fast", "Fast", "Slow", "Very Slow"]),
    FieldDef::choice("fb-design", RATING),
    FieldDef::choice("fb-support", RATING),
    FieldDef::choice("fb-value", RATING),
    FieldDef::choice("fb-recommend", AGREEMENT),
    FieldDef::choice("fb-return", &["Yes", "Maybe", "No"]),
    FieldDef::text("fb-liked"),
    FieldDef::text("fb-improve"),
    FieldDef::text("fb-comments"),
];

static SURVEY_FIELDS: &[FieldDef] = &[
    FieldDef::choice(
        "survey-age",
        &["Under 18", "18-24", "25-34", "35-44", "45-54", "55+"],
    ),
    FieldDef::choice(
        "survey-gender",
        &["Female", "Male", "Non-binary", "Prefer not to say"],
    ),
    FieldDef::choice(
        "survey-role",
        &["Student", "Employed", "Self-employed", "Retired", "Other"],
    ),
    FieldDef::choice(
        "survey-hear",
        &["Search Engine", "Social Media", "Friend", "Advertisement", "Other"],
    ),
    FieldDef {
        id: "survey-hear-other",
        kind: FieldKind::ConditionalText {
            trigger: "survey-hear",
            value: "Other",
        },
    },
    FieldDef::choice("survey-usage", &["Work", "Personal", "Both"]),
    FieldDef::choice(
        "survey-frequency",
        &["Daily", "Weekly", "Monthly", "Rarely"],
    ),
    FieldDef::choice("survey-device", &["Desktop", "Laptop", "Tablet", "Phone"]),
    FieldDef::choice(
        "survey-browser",
        &["Chrome", "Firefox", "Safari", "Edge", "Other"],
    ),
    FieldDef::choice("survey-performance", RATING),
    FieldDef::choice("survey-reliability", RATING),
    FieldDef::choice("survey-design", RATING),
    FieldDef::choice(
        "survey-pricing",
        &["Too High", "Fair", "Good Value", "No Opinion"],
    ),
    FieldDef::choice("survey-support", RATING),
    FieldDef::choice("survey-recommend", AGREEMENT),
    FieldDef::text("survey-liked"),
    FieldDef::text("survey-missing"),
    FieldDef::text("survey-suggestions"),
];
