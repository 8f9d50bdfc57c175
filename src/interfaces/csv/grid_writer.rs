use crate::application::engine::GridSnapshot;
use crate::error::Result;
use std::io::Write;

/// Writes the resolved grid as CSV.
///
/// The first column is the row id; the remaining columns follow the
/// validation weight order. Cells merged by the row-span layout are printed
/// only on their anchor row and left blank on the rows they span.
pub struct GridWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> GridWriter<W> {
    pub fn new(target: W) -> Self {
        let writer = csv::WriterBuilder::new().from_writer(target);
        Self { writer }
    }

    pub fn write_grid(&mut self, snapshot: &GridSnapshot) -> Result<()> {
        let mut header = vec!["row".to_string()];
        header.extend(snapshot.validations.iter().map(|v| v.name.clone()));
        self.writer.write_record(&header)?;

        for row in &snapshot.rows {
            let mut record = vec![row.row_id.to_string()];
            for validation in &snapshot.validations {
                let cell = if snapshot.spans.displays_cell(validation.r#type, row) {
                    row.answer_for(validation.id)
                        .map(|a| a.answer.clone())
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                record.push(cell);
            }
            self.writer.write_record(&record)?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answer::{Feature, FeaturePrecondition, ValidationAnswer, ValidationRow};
    use crate::domain::rowspan::RowSpans;
    use crate::domain::validation::{Validation, ValidationType};

    fn validation(id: i64, name: &str, r#type: ValidationType) -> Validation {
        Validation {
            id,
            name: name.to_string(),
            weight: id as i32,
            r#type,
            autofill: vec![],
        }
    }

    fn answer(
        row_id: i64,
        validation_id: i64,
        value: &str,
        r#type: ValidationType,
        feature_id: i64,
    ) -> ValidationAnswer {
        ValidationAnswer {
            id: Some(row_id * 10 + validation_id),
            row_id,
            validation_id,
            answer: value.to_string(),
            r#type,
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
    fn test_grid_output_merges_spanned_cells() {
        let validations = vec![
            validation(1, "Feature", ValidationType::Feature),
            validation(2, "Scenario", ValidationType::Text),
        ];
        let rows = vec![
            ValidationRow {
                row_id: 1,
                answers: vec![
                    answer(1, 1, "login", ValidationType::Feature, 7),
                    answer(1, 2, "happy path", ValidationType::Text, 7),
                ],
            },
            ValidationRow {
                row_id: 2,
                answers: vec![
                    answer(2, 1, "login", ValidationType::Feature, 7),
                    answer(2, 2, "bad password", ValidationType::Text, 7),
                ],
            },
        ];
        let spans = RowSpans::compute(&rows);
        let snapshot = GridSnapshot {
            validations,
            rows,
            spans,
        };

        let mut out = Vec::new();
        GridWriter::new(&mut out).write_grid(&snapshot).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.starts_with("row,Feature,Scenario\n"));
        assert!(csv.contains("1,login,happy path\n"));
        // The merged feature cell prints only on its anchor row.
        assert!(csv.contains("2,,bad password\n"));
    }
}
