use serde::{Deserialize, Serialize};

/// Governs the input widget and the autofill behavior of a column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationType {
    Select,
    Text,
    Do,
    Feature,
    Fill,
    Stakeholder,
    FeaturePrecondition,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutofillKind {
    Combination,
    Fill,
}

/// Declares that one validation's answer feeds another.
///
/// The rule lives on the *target* validation; `source_id` names the
/// validation whose answer contributes, and `weight` orders contributions.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AutofillRule {
    #[serde(rename = "validationFilledById")]
    pub source_id: Option<i64>,
    pub r#type: AutofillKind,
    pub weight: i32,
}

/// Definition of one table column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub id: i64,
    pub name: String,
    pub weight: i32,
    pub r#type: ValidationType,
    #[serde(rename = "validationAutofillList", default)]
    pub autofill: Vec<AutofillRule>,
}

impl Validation {
    /// True if any of this validation's autofill rules names `source_id`
    /// as a contributing source.
    pub fn is_filled_by(&self, source_id: i64) -> bool {
        self.autofill
            .iter()
            .any(|rule| rule.source_id == Some(source_id))
    }
}

/// Read-only secondary listing, ordered by weight. Carries no mutation logic.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub id: i64,
    pub weight: i32,
    pub name_et: Option<String>,
    pub name_en: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: Option<i64>,
    pub name: String,
}
