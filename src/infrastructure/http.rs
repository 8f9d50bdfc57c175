use crate::domain::answer::{Feature, FeaturePrecondition, ValidationAnswer};
use crate::domain::combination::ValidationCombinationResult;
use crate::domain::ports::{FeatureApi, ValidationApi};
use crate::domain::validation::{Questionnaire, Validation, ValidationSummary};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde_json::json;

/// REST adapter for the questionnaire backend.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EngineError::Api { status, message });
        }
        Ok(response)
    }
}

#[async_trait]
impl ValidationApi for HttpBackend {
    async fn list_questionnaires(&self) -> Result<Vec<Questionnaire>> {
        let response = self.client.get(self.url("/api/questionnaire")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn save_questionnaire(&self, name: &str) -> Result<Questionnaire> {
        let response = self
            .client
            .post(self.url("/api/questionnaire"))
            .json(&json!({ "id": null, "name": name }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_questionnaire(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/questionnaire/{}", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_validations(&self) -> Result<Vec<Validation>> {
        let response = self.client.get(self.url("/api/validation")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_summaries(&self) -> Result<Vec<ValidationSummary>> {
        let response = self
            .client
            .get(self.url("/api/validation-summary"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_combination_results(&self) -> Result<Vec<ValidationCombinationResult>> {
        let response = self
            .client
            .get(self.url("/api/validation-combination-result"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_answers(
        &self,
        questionnaire_id: i64,
        feature_group_id: i64,
    ) -> Result<Vec<ValidationAnswer>> {
        let response = self
            .client
            .get(self.url("/api/validation-answer"))
            .query(&[
                ("questionnaireId", questionnaire_id),
                ("featureGroupId", feature_group_id),
            ])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn save_answer(&self, answer: &ValidationAnswer) -> Result<ValidationAnswer> {
        log::debug!(
            "saving answer {:?} (row {}, validation {})",
            answer.id,
            answer.row_id,
            answer.validation_id
        );
        let response = self
            .client
            .post(self.url("/api/validation-answer"))
            .json(answer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_answers(&self, questionnaire_id: i64, row_id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/api/validation-answer"))
            .query(&[("questionnaireId", questionnaire_id), ("rowId", row_id)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl FeatureApi for HttpBackend {
    async fn create_feature(&self, answer: &str) -> Result<Feature> {
        let response = self
            .client
            .post(self.url("/api/feature"))
            .json(&json!({ "answer": answer }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_feature(&self, id: i64, answer: &str) -> Result<Feature> {
        let response = self
            .client
            .put(self.url(&format!("/api/feature/{}", id)))
            .json(&json!({ "answer": answer }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn create_precondition(&self, answer: &str) -> Result<FeaturePrecondition> {
        let response = self
            .client
            .post(self.url("/api/feature-precondition"))
            .json(&json!({ "answer": answer }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_precondition(&self, id: i64, answer: &str) -> Result<FeaturePrecondition> {
        let response = self
            .client
            .put(self.url(&format!("/api/feature-precondition/{}", id)))
            .json(&json!({ "answer": answer }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:8080/");
        assert_eq!(
            backend.url("/api/validation"),
            "http://localhost:8080/api/validation"
        );
    }
}
