use super::validation::ValidationType;
use serde::{Deserialize, Serialize};

/// Externally owned feature entity. A row's first answer's feature id
/// groups rows for display.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: i64,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePrecondition {
    pub id: i64,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub id: i64,
    pub name: String,
}

/// One cell of the answer table.
///
/// `r#type` is copied from the owning `Validation` at creation time and is
/// immutable for the lifetime of the answer. `id` is `None` until the
/// backend assigns one on first save.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationAnswer {
    pub id: Option<i64>,
    pub row_id: i64,
    pub validation_id: i64,
    pub answer: String,
    pub r#type: ValidationType,
    pub questionnaire_id: i64,
    pub feature_group_id: i64,
    pub feature: Feature,
    pub feature_precondition: FeaturePrecondition,
    pub stakeholder: Option<Stakeholder>,
}

/// One end-to-end scenario for a feature: a row id plus the ordered
/// answers belonging to it (at most one per validation id).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRow {
    pub row_id: i64,
    pub answers: Vec<ValidationAnswer>,
}

impl ValidationRow {
    pub fn answer_for(&self, validation_id: i64) -> Option<&ValidationAnswer> {
        self.answers.iter().find(|a| a.validation_id == validation_id)
    }

    /// The feature id used for row ordering and row-span grouping.
    pub fn feature_id(&self) -> i64 {
        self.answers.first().map(|a| a.feature.id).unwrap_or(0)
    }
}

/// Groups a flat answer list into rows by row id, preserving the first-seen
/// order of rows and the order of answers within each row.
pub fn group_into_rows(answers: Vec<ValidationAnswer>) -> Vec<ValidationRow> {
    let mut rows: Vec<ValidationRow> = Vec::new();
    for answer in answers {
        if let Some(row) = rows.iter_mut().find(|r| r.row_id == answer.row_id) {
            row.answers.push(answer);
        } else {
            rows.push(ValidationRow {
                row_id: answer.row_id,
                answers: vec![answer],
            });
        }
    }
    rows
}

/// Sorts rows by (first answer's feature id, then row id) ascending.
pub fn sort_rows(rows: &mut [ValidationRow]) {
    rows.sort_by(|a, b| {
        a.feature_id()
            .cmp(&b.feature_id())
            .then(a.row_id.cmp(&b.row_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(row_id: i64, validation_id: i64, feature_id: i64) -> ValidationAnswer {
        ValidationAnswer {
            id: Some(row_id * 100 + validation_id),
            row_id,
            validation_id,
            answer: String::new(),
            r#type: ValidationType::Text,
            questionnaire_id: 1,
            feature_group_id: 1,
            feature: Feature {
                id: feature_id,
                answer: String::new(),
            },
            feature_precondition: FeaturePrecondition {
                id: feature_id,
                answer: String::new(),
            },
            stakeholder: None,
        }
    }

    #[test]
    fn test_group_into_rows_preserves_order() {
        let answers = vec![
            answer(2, 1, 1),
            answer(1, 1, 1),
            answer(2, 2, 1),
            answer(1, 2, 1),
        ];

        let rows = group_into_rows(answers);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_id, 2);
        assert_eq!(rows[0].answers.len(), 2);
        assert_eq!(rows[1].row_id, 1);
    }

    #[test]
    fn test_sort_rows_by_feature_then_row_id() {
        let mut rows = group_into_rows(vec![
            answer(3, 1, 2),
            answer(2, 1, 1),
            answer(1, 1, 2),
        ]);

        sort_rows(&mut rows);
        let order: Vec<i64> = rows.iter().map(|r| r.row_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn test_answer_for() {
        let rows = group_into_rows(vec![answer(1, 1, 1), answer(1, 2, 1)]);
        assert!(rows[0].answer_for(2).is_some());
        assert!(rows[0].answer_for(9).is_none());
    }
}
