use crate::domain::answer::{Feature, FeaturePrecondition, ValidationAnswer};
use crate::domain::combination::ValidationCombinationResult;
use crate::domain::ports::{FeatureApi, ValidationApi};
use crate::domain::validation::{Questionnaire, Validation, ValidationSummary};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Seed data for the in-memory backend, shaped like the backend's JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureData {
    #[serde(default)]
    pub questionnaires: Vec<Questionnaire>,
    #[serde(default)]
    pub validations: Vec<Validation>,
    #[serde(default)]
    pub validation_summaries: Vec<ValidationSummary>,
    #[serde(default)]
    pub validation_combination_results: Vec<ValidationCombinationResult>,
    #[serde(default)]
    pub validation_answers: Vec<ValidationAnswer>,
}

#[derive(Default)]
struct Tables {
    questionnaires: Vec<Questionnaire>,
    validations: Vec<Validation>,
    summaries: Vec<ValidationSummary>,
    combination_results: Vec<ValidationCombinationResult>,
    answers: Vec<ValidationAnswer>,
    features: HashMap<i64, Feature>,
    preconditions: HashMap<i64, FeaturePrecondition>,
    next_id: i64,
    answer_saves: usize,
}

/// An in-process stand-in for the remote backend.
///
/// Uses `Arc<RwLock<..>>` tables for shared concurrent access. Created
/// entities get `max + 1` style ids from a single sequence. Used by tests
/// and by the CLI's `--fixture` mode.
#[derive(Default, Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: FixtureData) -> Self {
        let mut next_id = 0;
        for answer in &data.validation_answers {
            if let Some(id) = answer.id {
                next_id = next_id.max(id);
            }
            next_id = next_id.max(answer.feature.id);
            next_id = next_id.max(answer.feature_precondition.id);
        }
        for questionnaire in &data.questionnaires {
            if let Some(id) = questionnaire.id {
                next_id = next_id.max(id);
            }
        }

        let mut features = HashMap::new();
        let mut preconditions = HashMap::new();
        for answer in &data.validation_answers {
            features.insert(answer.feature.id, answer.feature.clone());
            preconditions.insert(
                answer.feature_precondition.id,
                answer.feature_precondition.clone(),
            );
        }

        Self {
            tables: Arc::new(RwLock::new(Tables {
                questionnaires: data.questionnaires,
                validations: data.validations,
                summaries: data.validation_summaries,
                combination_results: data.validation_combination_results,
                answers: data.validation_answers,
                features,
                preconditions,
                next_id,
                answer_saves: 0,
            })),
        }
    }

    pub fn from_fixture_json(json: &str) -> Result<Self> {
        let data: FixtureData = serde_json::from_str(json)?;
        Ok(Self::with_data(data))
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_fixture_json(&json)
    }

    /// Number of answer save calls seen, for asserting debounce behavior.
    pub async fn answer_save_calls(&self) -> usize {
        self.tables.read().await.answer_saves
    }

    pub async fn answers(&self) -> Vec<ValidationAnswer> {
        self.tables.read().await.answers.clone()
    }

    pub async fn feature(&self, id: i64) -> Option<Feature> {
        self.tables.read().await.features.get(&id).cloned()
    }

    pub async fn precondition(&self, id: i64) -> Option<FeaturePrecondition> {
        self.tables.read().await.preconditions.get(&id).cloned()
    }

    pub async fn feature_count(&self) -> usize {
        self.tables.read().await.features.len()
    }

    pub async fn precondition_count(&self) -> usize {
        self.tables.read().await.preconditions.len()
    }
}

impl Tables {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[async_trait]
impl ValidationApi for InMemoryBackend {
    async fn list_questionnaires(&self) -> Result<Vec<Questionnaire>> {
        Ok(self.tables.read().await.questionnaires.clone())
    }

    async fn save_questionnaire(&self, name: &str) -> Result<Questionnaire> {
        let mut tables = self.tables.write().await;
        let id = tables.assign_id();
        let questionnaire = Questionnaire {
            id: Some(id),
            name: name.to_string(),
        };
        tables.questionnaires.push(questionnaire.clone());
        Ok(questionnaire)
    }

    async fn delete_questionnaire(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.questionnaires.retain(|q| q.id != Some(id));
        Ok(())
    }

    async fn list_validations(&self) -> Result<Vec<Validation>> {
        Ok(self.tables.read().await.validations.clone())
    }

    async fn list_summaries(&self) -> Result<Vec<ValidationSummary>> {
        Ok(self.tables.read().await.summaries.clone())
    }

    async fn list_combination_results(&self) -> Result<Vec<ValidationCombinationResult>> {
        Ok(self.tables.read().await.combination_results.clone())
    }

    async fn list_answers(
        &self,
        questionnaire_id: i64,
        feature_group_id: i64,
    ) -> Result<Vec<ValidationAnswer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| {
                a.questionnaire_id == questionnaire_id && a.feature_group_id == feature_group_id
            })
            .cloned()
            .collect())
    }

    async fn save_answer(&self, answer: &ValidationAnswer) -> Result<ValidationAnswer> {
        let mut tables = self.tables.write().await;
        tables.answer_saves += 1;
        let mut saved = answer.clone();
        match saved.id {
            Some(id) => {
                if let Some(existing) = tables.answers.iter_mut().find(|a| a.id == Some(id)) {
                    *existing = saved.clone();
                } else {
                    tables.answers.push(saved.clone());
                }
            }
            None => {
                saved.id = Some(tables.assign_id());
                tables.answers.push(saved.clone());
            }
        }
        Ok(saved)
    }

    async fn delete_answers(&self, questionnaire_id: i64, row_id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .answers
            .retain(|a| !(a.questionnaire_id == questionnaire_id && a.row_id == row_id));
        Ok(())
    }
}

#[async_trait]
impl FeatureApi for InMemoryBackend {
    async fn create_feature(&self, answer: &str) -> Result<Feature> {
        let mut tables = self.tables.write().await;
        let id = tables.assign_id();
        let feature = Feature {
            id,
            answer: answer.to_string(),
        };
        tables.features.insert(id, feature.clone());
        Ok(feature)
    }

    async fn update_feature(&self, id: i64, answer: &str) -> Result<Feature> {
        let mut tables = self.tables.write().await;
        let feature = tables
            .features
            .get_mut(&id)
            .ok_or_else(|| EngineError::Validation(format!("unknown feature id: {}", id)))?;
        feature.answer = answer.to_string();
        Ok(feature.clone())
    }

    async fn create_precondition(&self, answer: &str) -> Result<FeaturePrecondition> {
        let mut tables = self.tables.write().await;
        let id = tables.assign_id();
        let precondition = FeaturePrecondition {
            id,
            answer: answer.to_string(),
        };
        tables.preconditions.insert(id, precondition.clone());
        Ok(precondition)
    }

    async fn update_precondition(&self, id: i64, answer: &str) -> Result<FeaturePrecondition> {
        let mut tables = self.tables.write().await;
        let precondition = tables
            .preconditions
            .get_mut(&id)
            .ok_or_else(|| EngineError::Validation(format!("unknown precondition id: {}", id)))?;
        precondition.answer = answer.to_string();
        Ok(precondition.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_answer_assigns_ids() {
        let backend = InMemoryBackend::new();
        let draft = ValidationAnswer {
            id: None,
            row_id: 1,
            validation_id: 1,
            answer: "hello".to_string(),
            r#type: crate::domain::validation::ValidationType::Text,
            questionnaire_id: 1,
            feature_group_id: 1,
            feature: Feature {
                id: 1,
                answer: String::new(),
            },
            feature_precondition: FeaturePrecondition {
                id: 2,
                answer: String::new(),
            },
            stakeholder: None,
        };

        let saved = backend.save_answer(&draft).await.unwrap();
        assert!(saved.id.is_some());

        let listed = backend.list_answers(1, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].answer, "hello");

        // Upsert by id replaces in place.
        let mut updated = saved.clone();
        updated.answer = "changed".to_string();
        backend.save_answer(&updated).await.unwrap();
        let listed = backend.list_answers(1, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].answer, "changed");
    }

    #[tokio::test]
    async fn test_delete_answers_by_questionnaire_and_row() {
        let backend = InMemoryBackend::new();
        for row_id in 1..=2 {
            let draft = ValidationAnswer {
                id: None,
                row_id,
                validation_id: 1,
                answer: String::new(),
                r#type: crate::domain::validation::ValidationType::Text,
                questionnaire_id: 1,
                feature_group_id: 1,
                feature: Feature {
                    id: 1,
                    answer: String::new(),
                },
                feature_precondition: FeaturePrecondition {
                    id: 2,
                    answer: String::new(),
                },
                stakeholder: None,
            };
            backend.save_answer(&draft).await.unwrap();
        }

        backend.delete_answers(1, 1).await.unwrap();
        let remaining = backend.list_answers(1, 1).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].row_id, 2);
    }

    #[tokio::test]
    async fn test_feature_lifecycle() {
        let backend = InMemoryBackend::new();
        let feature = backend.create_feature("").await.unwrap();
        let updated = backend.update_feature(feature.id, "filled").await.unwrap();
        assert_eq!(updated.answer, "filled");

        assert!(backend.update_feature(999, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_fixture_loading() {
        let json = r#"{
            "validations": [
                {"id": 1, "name": "Do", "weight": 1, "type": "DO"}
            ],
            "validationSummaries": [
                {"id": 1, "weight": 1, "nameEt": "Kokku", "nameEn": "Total"}
            ]
        }"#;

        let backend = InMemoryBackend::from_fixture_json(json).unwrap();
        assert_eq!(backend.list_validations().await.unwrap().len(), 1);
        assert_eq!(backend.list_summaries().await.unwrap().len(), 1);
        assert!(backend.list_answers(1, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_questionnaire_lifecycle() {
        let backend = InMemoryBackend::new();
        let saved = backend.save_questionnaire("Q1").await.unwrap();
        assert_eq!(backend.list_questionnaires().await.unwrap().len(), 1);

        backend.delete_questionnaire(saved.id.unwrap()).await.unwrap();
        assert!(backend.list_questionnaires().await.unwrap().is_empty());
    }
}
