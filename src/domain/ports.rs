use super::answer::{Feature, FeaturePrecondition, ValidationAnswer};
use super::combination::ValidationCombinationResult;
use super::validation::{Questionnaire, Validation, ValidationSummary};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ValidationApi: Send + Sync {
    async fn list_questionnaires(&self) -> Result<Vec<Questionnaire>>;
    async fn save_questionnaire(&self, name: &str) -> Result<Questionnaire>;
    async fn delete_questionnaire(&self, id: i64) -> Result<()>;

    async fn list_validations(&self) -> Result<Vec<Validation>>;
    async fn list_summaries(&self) -> Result<Vec<ValidationSummary>>;
    async fn list_combination_results(&self) -> Result<Vec<ValidationCombinationResult>>;

    async fn list_answers(
        &self,
        questionnaire_id: i64,
        feature_group_id: i64,
    ) -> Result<Vec<ValidationAnswer>>;
    /// Upsert by id; answers without an id get one assigned by the backend.
    async fn save_answer(&self, answer: &ValidationAnswer) -> Result<ValidationAnswer>;
    async fn delete_answers(&self, questionnaire_id: i64, row_id: i64) -> Result<()>;
}

#[async_trait]
pub trait FeatureApi: Send + Sync {
    async fn create_feature(&self, answer: &str) -> Result<Feature>;
    async fn update_feature(&self, id: i64, answer: &str) -> Result<Feature>;
    async fn create_precondition(&self, answer: &str) -> Result<FeaturePrecondition>;
    async fn update_precondition(&self, id: i64, answer: &str) -> Result<FeaturePrecondition>;
}

pub type ValidationApiBox = Box<dyn ValidationApi>;
pub type FeatureApiBox = Box<dyn FeatureApi>;
