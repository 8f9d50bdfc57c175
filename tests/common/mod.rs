use answergrid::application::engine::{AnswerEngine, EngineConfig};
use answergrid::domain::answer::{Feature, FeaturePrecondition, ValidationAnswer};
use answergrid::domain::combination::{
    Locale, ValidationCombination, ValidationCombinationResult, ValidationRef,
};
use answergrid::domain::validation::{AutofillKind, AutofillRule, Validation, ValidationType};
use answergrid::infrastructure::in_memory::InMemoryBackend;
use std::time::Duration;

pub const QUESTIONNAIRE_ID: i64 = 1;
pub const FEATURE_GROUP_ID: i64 = 1;

pub fn validation(id: i64, name: &str, weight: i32, r#type: ValidationType) -> Validation {
    Validation {
        id,
        name: name.to_string(),
        weight,
        r#type,
        autofill: vec![],
    }
}

pub fn rule(source_id: i64, kind: AutofillKind, weight: i32) -> AutofillRule {
    AutofillRule {
        source_id: Some(source_id),
        r#type: kind,
        weight,
    }
}

pub fn combination_result(
    id: i64,
    name_en: &str,
    name_et: &str,
    pins: &[(i64, &str)],
) -> ValidationCombinationResult {
    ValidationCombinationResult {
        id,
        name_et: Some(name_et.to_string()),
        name_en: Some(name_en.to_string()),
        result_et: None,
        result_en: None,
        validation_combinations: pins
            .iter()
            .map(|(validation_id, value)| ValidationCombination {
                validation: ValidationRef { id: *validation_id },
                validation_value: value.to_string(),
            })
            .collect(),
    }
}

pub fn answer(
    id: i64,
    row_id: i64,
    validation: &Validation,
    value: &str,
    feature_id: i64,
    precondition_id: i64,
) -> ValidationAnswer {
    ValidationAnswer {
        id: Some(id),
        row_id,
        validation_id: validation.id,
        answer: value.to_string(),
        r#type: validation.r#type,
        questionnaire_id: QUESTIONNAIRE_ID,
        feature_group_id: FEATURE_GROUP_ID,
        feature: Feature {
            id: feature_id,
            answer: String::new(),
        },
        feature_precondition: FeaturePrecondition {
            id: precondition_id,
            answer: String::new(),
        },
        stakeholder: None,
    }
}

/// Engine over the given backend with a short debounce, so tests flush fast.
pub fn engine_over(backend: &InMemoryBackend, locale: Locale) -> AnswerEngine {
    let config = EngineConfig::new(QUESTIONNAIRE_ID, FEATURE_GROUP_ID)
        .with_locale(locale)
        .with_save_debounce(Duration::from_millis(10));
    AnswerEngine::new(Box::new(backend.clone()), Box::new(backend.clone()), config)
}
