use crate::domain::answer::{
    Feature, FeaturePrecondition, Stakeholder, ValidationAnswer, ValidationRow, group_into_rows,
    sort_rows,
};
use crate::domain::combination::{Locale, ValidationCombinationResult};
use crate::domain::ports::{FeatureApiBox, ValidationApiBox};
use crate::domain::rowspan::RowSpans;
use crate::domain::validation::{AutofillKind, Validation, ValidationSummary, ValidationType};
use crate::error::{EngineError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::debounce::SaveScheduler;

/// Delay between a cell edit and its persisted write. Matches the original
/// client's answer-update timeout.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub questionnaire_id: i64,
    pub feature_group_id: i64,
    pub locale: Locale,
    pub save_debounce: Duration,
}

impl EngineConfig {
    pub fn new(questionnaire_id: i64, feature_group_id: i64) -> Self {
        Self {
            questionnaire_id,
            feature_group_id,
            locale: Locale::default(),
            save_debounce: SAVE_DEBOUNCE,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_save_debounce(mut self, save_debounce: Duration) -> Self {
        self.save_debounce = save_debounce;
        self
    }
}

/// Read-side view of the loaded grid: column definitions, ordered rows and
/// the derived row-span layout.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    pub validations: Vec<Validation>,
    pub rows: Vec<ValidationRow>,
    pub spans: RowSpans,
}

#[derive(Default)]
struct EngineState {
    validations: Vec<Validation>,
    summaries: Vec<ValidationSummary>,
    combination_results: Vec<ValidationCombinationResult>,
    rows: Vec<ValidationRow>,
    spans: RowSpans,
}

/// The main entry point of the client: owns the in-memory answer matrix and
/// resolves every edit against the autofill/combination rules.
///
/// `AnswerEngine` holds the API ports and ensures sequential consistency by
/// awaiting each persistence call. Cell saves are debounced per answer id;
/// scheduling a new save for an answer cancels the pending one, so the last
/// edit wins.
pub struct AnswerEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    api: ValidationApiBox,
    features: FeatureApiBox,
    config: EngineConfig,
    state: RwLock<EngineState>,
    scheduler: SaveScheduler,
}

impl AnswerEngine {
    pub fn new(api: ValidationApiBox, features: FeatureApiBox, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                api,
                features,
                config,
                state: RwLock::new(EngineState::default()),
                scheduler: SaveScheduler::new(),
            }),
        }
    }

    /// Loads the column definitions, summaries and combination results, then
    /// the answers for the configured feature group. If no answers exist yet,
    /// synthesizes exactly one row.
    ///
    /// The three definition fetches run concurrently and are joined
    /// structurally, so legitimately empty lists complete the load normally.
    pub async fn load(&self) -> Result<()> {
        let inner = &self.inner;
        let (mut validations, mut summaries, combination_results) = tokio::try_join!(
            inner.api.list_validations(),
            inner.api.list_summaries(),
            inner.api.list_combination_results(),
        )?;
        validations.sort_by_key(|v| v.weight);
        summaries.sort_by_key(|s| s.weight);
        {
            let mut state = inner.state.write().await;
            state.validations = validations;
            state.summaries = summaries;
            state.combination_results = combination_results;
        }

        let answers = inner
            .api
            .list_answers(inner.config.questionnaire_id, inner.config.feature_group_id)
            .await?;
        if answers.is_empty() {
            self.add_row(None, None, None).await?;
        } else {
            let mut rows = group_into_rows(answers);
            sort_rows(&mut rows);
            let mut state = inner.state.write().await;
            state.spans = RowSpans::compute(&rows);
            state.rows = rows;
        }
        Ok(())
    }

    /// Appends a new row: one feature creation, one precondition creation,
    /// then one answer save per validation column, strictly sequential.
    ///
    /// Prefill is type-dependent: FEATURE_PRECONDITION takes the existing
    /// precondition's answer, FEATURE the feature's answer, STAKEHOLDER the
    /// stakeholder's name; every other type starts empty.
    pub async fn add_row(
        &self,
        existing_feature: Option<Feature>,
        existing_precondition: Option<FeaturePrecondition>,
        stakeholder: Option<Stakeholder>,
    ) -> Result<i64> {
        let inner = &self.inner;
        let (validations, max_row_id) = {
            let state = inner.state.read().await;
            let max = state.rows.iter().map(|r| r.row_id).max().unwrap_or(0);
            (state.validations.clone(), max)
        };

        let feature = match existing_feature {
            Some(feature) => feature,
            None => inner.features.create_feature("").await?,
        };
        let precondition = match existing_precondition.clone() {
            Some(precondition) => precondition,
            None => inner.features.create_precondition("").await?,
        };

        let row_id = max_row_id + 1;
        let mut answers = Vec::with_capacity(validations.len());
        for validation in &validations {
            let draft = ValidationAnswer {
                id: None,
                row_id,
                validation_id: validation.id,
                answer: prefill_answer(
                    validation.r#type,
                    Some(&feature),
                    existing_precondition.as_ref(),
                    stakeholder.as_ref(),
                ),
                r#type: validation.r#type,
                questionnaire_id: inner.config.questionnaire_id,
                feature_group_id: inner.config.feature_group_id,
                feature: feature.clone(),
                feature_precondition: precondition.clone(),
                stakeholder: stakeholder.clone(),
            };
            let saved = inner.api.save_answer(&draft).await?;
            answers.push(saved);
        }

        let mut state = inner.state.write().await;
        state.rows.push(ValidationRow { row_id, answers });
        sort_rows(&mut state.rows);
        state.spans = RowSpans::compute(&state.rows);
        log::debug!("added row {} with {} answers", row_id, validations.len());
        Ok(row_id)
    }

    /// Deletes the row's answers on the backend, then locally. Local state
    /// is untouched when the delete call fails.
    pub async fn delete_row(&self, row_id: i64) -> Result<()> {
        let inner = &self.inner;
        let exists = {
            let state = inner.state.read().await;
            state.rows.iter().any(|r| r.row_id == row_id)
        };
        if !exists {
            return Err(EngineError::UnknownRow(row_id));
        }

        inner
            .api
            .delete_answers(inner.config.questionnaire_id, row_id)
            .await?;
        let mut state = inner.state.write().await;
        state.rows.retain(|r| r.row_id != row_id);
        state.spans = RowSpans::compute(&state.rows);
        Ok(())
    }

    /// Applies a cell edit: optimistic local update, feature/precondition
    /// push-through for those types, sibling cascade across rows sharing the
    /// precondition, and a debounced save followed by autofill resolution.
    pub async fn set_answer(&self, answer_id: i64, value: &str) -> Result<()> {
        let inner = &self.inner;
        let (validation_type, feature_id, precondition_id) = {
            let mut state = inner.state.write().await;
            let answer = state
                .rows
                .iter_mut()
                .flat_map(|r| r.answers.iter_mut())
                .find(|a| a.id == Some(answer_id))
                .ok_or(EngineError::UnknownAnswer(answer_id))?;
            answer.answer = value.to_string();
            (answer.r#type, answer.feature.id, answer.feature_precondition.id)
        };

        if validation_type == ValidationType::Feature {
            inner.features.update_feature(feature_id, value).await?;
        }
        if validation_type == ValidationType::FeaturePrecondition {
            inner
                .features
                .update_precondition(precondition_id, value)
                .await?;
        }

        inner
            .cascade_siblings(answer_id, validation_type, precondition_id, value)
            .await;
        inner.schedule_save(answer_id).await;
        Ok(())
    }

    /// Replaces the answer's stakeholder reference, then runs the regular
    /// cell-edit path with the stakeholder's name as the new value.
    pub async fn set_stakeholder(&self, answer_id: i64, stakeholder: Stakeholder) -> Result<()> {
        {
            let mut state = self.inner.state.write().await;
            let answer = state
                .rows
                .iter_mut()
                .flat_map(|r| r.answers.iter_mut())
                .find(|a| a.id == Some(answer_id))
                .ok_or(EngineError::UnknownAnswer(answer_id))?;
            answer.stakeholder = Some(stakeholder.clone());
        }
        self.set_answer(answer_id, &stakeholder.name).await
    }

    /// Awaits every pending debounced save (and the resolution passes they
    /// trigger) until the engine is quiescent.
    pub async fn flush(&self) {
        self.inner.scheduler.flush().await;
    }

    pub async fn snapshot(&self) -> GridSnapshot {
        let state = self.inner.state.read().await;
        GridSnapshot {
            validations: state.validations.clone(),
            rows: state.rows.clone(),
            spans: state.spans.clone(),
        }
    }

    pub async fn summaries(&self) -> Vec<ValidationSummary> {
        self.inner.state.read().await.summaries.clone()
    }

    /// Looks up the answer id for a (row, validation) cell.
    pub async fn answer_id(&self, row_id: i64, validation_id: i64) -> Result<i64> {
        let state = self.inner.state.read().await;
        let row = state
            .rows
            .iter()
            .find(|r| r.row_id == row_id)
            .ok_or(EngineError::UnknownRow(row_id))?;
        row.answer_for(validation_id)
            .and_then(|a| a.id)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "row {} has no answer for validation {}",
                    row_id, validation_id
                ))
            })
    }
}

impl EngineInner {
    /// Propagates an edit to sibling answers of the same type sharing the
    /// edited answer's precondition id, across all rows. Only the three
    /// grouped types cascade: FEATURE_PRECONDITION copies the value, DO
    /// writes the locale's fixed label, STAKEHOLDER copies the stakeholder
    /// reference and its name. Each touched sibling gets its own debounced
    /// save and resolution pass.
    async fn cascade_siblings(
        self: &Arc<Self>,
        source_answer_id: i64,
        validation_type: ValidationType,
        precondition_id: i64,
        value: &str,
    ) {
        if !matches!(
            validation_type,
            ValidationType::Do | ValidationType::FeaturePrecondition | ValidationType::Stakeholder
        ) {
            return;
        }

        let mut touched = Vec::new();
        {
            let mut state = self.state.write().await;
            let source_stakeholder = state
                .rows
                .iter()
                .flat_map(|r| r.answers.iter())
                .find(|a| a.id == Some(source_answer_id))
                .and_then(|a| a.stakeholder.clone());

            for row in state.rows.iter_mut() {
                for answer in row.answers.iter_mut() {
                    if answer.feature_precondition.id != precondition_id
                        || answer.id == Some(source_answer_id)
                        || answer.r#type != validation_type
                    {
                        continue;
                    }
                    match validation_type {
                        ValidationType::FeaturePrecondition => {
                            answer.answer = value.to_string();
                        }
                        ValidationType::Do => {
                            answer.answer = self.config.locale.do_label().to_string();
                        }
                        ValidationType::Stakeholder => {
                            answer.stakeholder = source_stakeholder.clone();
                            if let Some(stakeholder) = &answer.stakeholder {
                                answer.answer = stakeholder.name.clone();
                            }
                        }
                        _ => {}
                    }
                    if let Some(id) = answer.id {
                        touched.push(id);
                    }
                }
            }
        }

        log::debug!(
            "cascading {:?} edit to {} sibling answers",
            validation_type,
            touched.len()
        );
        for id in touched {
            self.schedule_save(id).await;
        }
    }

    /// Schedules a debounced save for one answer, replacing any pending save
    /// for the same answer id. After the delay the current value is persisted
    /// and the answer's validation is resolved against the autofill rules.
    /// Failures in this background path are logged and do not propagate.
    async fn schedule_save(self: &Arc<Self>, answer_id: i64) {
        let inner = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.config.save_debounce).await;
            if let Err(e) = inner.persist_and_resolve(answer_id).await {
                log::warn!("deferred save for answer {} failed: {}", answer_id, e);
            }
        });
        self.scheduler.replace(answer_id, handle).await;
    }

    async fn persist_and_resolve(&self, answer_id: i64) -> Result<()> {
        let (answer, validation_id, row_id) = {
            let state = self.state.read().await;
            let answer = state
                .rows
                .iter()
                .flat_map(|r| r.answers.iter())
                .find(|a| a.id == Some(answer_id))
                .ok_or(EngineError::UnknownAnswer(answer_id))?
                .clone();
            let validation_id = answer.validation_id;
            let row_id = answer.row_id;
            (answer, validation_id, row_id)
        };
        self.api.save_answer(&answer).await?;

        let mut visited = HashSet::new();
        self.resolve_autofill(validation_id, row_id, &mut visited)
            .await
    }

    /// Depth-first autofill resolution starting from an edited validation.
    ///
    /// For every validation fed by the source, either resolves a combination
    /// outcome (all rules COMBINATION, all sources SELECT) and recurses, or
    /// concatenates the contributing values ascending by weight. Targets with
    /// a missing or empty source answer are skipped silently. The `visited`
    /// set bounds cyclic rule graphs: each validation is filled at most once
    /// per triggering edit.
    fn resolve_autofill<'a>(
        &'a self,
        source_validation_id: i64,
        row_id: i64,
        visited: &'a mut HashSet<i64>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut actions = Vec::new();
            {
                let mut state = self.state.write().await;
                let targets: Vec<Validation> = state
                    .validations
                    .iter()
                    .filter(|v| v.is_filled_by(source_validation_id))
                    .cloned()
                    .collect();
                let combination_results = state.combination_results.clone();

                for target in targets {
                    if visited.contains(&target.id) {
                        continue;
                    }
                    let Some(row) = state.rows.iter().find(|r| r.row_id == row_id) else {
                        return Ok(());
                    };
                    if !all_sources_filled(&target, row) {
                        continue;
                    }

                    let (mut contributions, combination_mode) =
                        collect_contributions(&target, row);
                    contributions.sort_by_key(|c| c.weight);

                    let outcome = if combination_mode {
                        first_matching_result(&combination_results, &mut contributions)
                            .map(|result| (result.label(self.config.locale), true))
                    } else {
                        Some((concat_by_weight(&contributions), false))
                    };
                    let Some((value, recurse)) = outcome else {
                        // No combination matched: leave the target untouched.
                        continue;
                    };

                    let target_answer = state
                        .rows
                        .iter_mut()
                        .find(|r| r.row_id == row_id)
                        .and_then(|r| {
                            r.answers
                                .iter_mut()
                                .find(|a| a.validation_id == target.id)
                        });
                    let Some(answer) = target_answer else {
                        continue;
                    };
                    answer.answer = value;
                    visited.insert(target.id);
                    actions.push((answer.clone(), target.id, recurse));
                }
            }

            for (answer, target_validation_id, recurse) in actions {
                self.api.save_answer(&answer).await?;
                log::debug!(
                    "autofilled validation {} in row {}",
                    target_validation_id,
                    row_id
                );
                if recurse {
                    self.resolve_autofill(target_validation_id, row_id, visited)
                        .await?;
                }
            }
            Ok(())
        })
    }
}

fn prefill_answer(
    validation_type: ValidationType,
    feature: Option<&Feature>,
    precondition: Option<&FeaturePrecondition>,
    stakeholder: Option<&Stakeholder>,
) -> String {
    match validation_type {
        ValidationType::FeaturePrecondition => precondition
            .map(|p| p.answer.clone())
            .unwrap_or_default(),
        ValidationType::Feature => feature.map(|f| f.answer.clone()).unwrap_or_default(),
        ValidationType::Stakeholder => stakeholder.map(|s| s.name.clone()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// One contributing answer during resolution: which validation it came
/// from, its current value, the rule weight ordering it, and whether a
/// combination pin has claimed it.
#[derive(Debug, Clone)]
struct Contribution {
    validation_id: i64,
    value: String,
    weight: i32,
    matched: bool,
}

fn all_sources_filled(target: &Validation, row: &ValidationRow) -> bool {
    target.autofill.iter().all(|rule| {
        rule.source_id
            .and_then(|id| row.answer_for(id))
            .map(|a| !a.answer.is_empty())
            .unwrap_or(false)
    })
}

fn collect_contributions(target: &Validation, row: &ValidationRow) -> (Vec<Contribution>, bool) {
    let mut combination_rules_only = true;
    let mut select_sources_only = true;
    let mut contributions = Vec::new();
    for rule in &target.autofill {
        if rule.r#type != AutofillKind::Combination {
            combination_rules_only = false;
        }
        let Some(answer) = rule.source_id.and_then(|id| row.answer_for(id)) else {
            continue;
        };
        if answer.r#type != ValidationType::Select {
            select_sources_only = false;
        }
        contributions.push(Contribution {
            validation_id: answer.validation_id,
            value: answer.answer.clone(),
            weight: rule.weight,
            matched: false,
        });
    }
    (contributions, combination_rules_only && select_sources_only)
}

/// First combination result (in list order) whose pinned pairs are all
/// satisfied. Every pin must claim a distinct contribution with the exact
/// (validation id, value); partial matches are rejected.
fn first_matching_result<'a>(
    results: &'a [ValidationCombinationResult],
    contributions: &mut [Contribution],
) -> Option<&'a ValidationCombinationResult> {
    results
        .iter()
        .find(|result| matches_combination(result, contributions))
}

fn matches_combination(
    result: &ValidationCombinationResult,
    contributions: &mut [Contribution],
) -> bool {
    if result.validation_combinations.is_empty() {
        return false;
    }
    for contribution in contributions.iter_mut() {
        contribution.matched = false;
    }
    for pin in &result.validation_combinations {
        let claimed = contributions.iter_mut().find(|c| {
            !c.matched && c.validation_id == pin.validation.id && c.value == pin.validation_value
        });
        match claimed {
            Some(contribution) => contribution.matched = true,
            None => return false,
        }
    }
    true
}

/// Weight-ascending concatenation, each value prefixed with a single space.
/// The leading space matches the original client's output.
fn concat_by_weight(contributions: &[Contribution]) -> String {
    let mut combined = String::new();
    for contribution in contributions {
        combined.push(' ');
        combined.push_str(&contribution.value);
    }
    combined
}
