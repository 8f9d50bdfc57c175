use super::answer::ValidationRow;
use super::validation::ValidationType;

/// Ordered grouping of row ids sharing one grouping key (a feature id or a
/// feature-precondition id), first-seen order preserved.
#[derive(Debug, PartialEq, Clone)]
pub struct RowSpan {
    pub group_id: i64,
    pub row_ids: Vec<i64>,
}

/// First-seen grouping over one key extractor.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct SpanIndex {
    spans: Vec<RowSpan>,
}

impl SpanIndex {
    fn insert(&mut self, group_id: i64, row_id: i64) {
        if let Some(span) = self.spans.iter_mut().find(|s| s.group_id == group_id) {
            if !span.row_ids.contains(&row_id) {
                span.row_ids.push(row_id);
            }
        } else {
            self.spans.push(RowSpan {
                group_id,
                row_ids: vec![row_id],
            });
        }
    }

    /// Number of distinct rows sharing the key; 1 for unknown keys so a
    /// cell always occupies at least its own row.
    pub fn span_len(&self, group_id: i64) -> usize {
        self.spans
            .iter()
            .find(|s| s.group_id == group_id)
            .map(|s| s.row_ids.len())
            .unwrap_or(1)
    }

    /// The row that displays the merged cell: the first row in which the
    /// key was seen.
    pub fn anchor_row(&self, group_id: i64) -> Option<i64> {
        self.spans
            .iter()
            .find(|s| s.group_id == group_id)
            .and_then(|s| s.row_ids.first().copied())
    }

    pub fn is_anchor(&self, group_id: i64, row_id: i64) -> bool {
        match self.anchor_row(group_id) {
            Some(anchor) => anchor == row_id,
            None => true,
        }
    }

    pub fn spans(&self) -> &[RowSpan] {
        &self.spans
    }
}

/// Row-span layout for the current row set: one grouping by feature id and
/// one by feature-precondition id.
///
/// Purely derived from the rows; recomputed after every structural change
/// and never mutates answers.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct RowSpans {
    pub by_feature: SpanIndex,
    pub by_precondition: SpanIndex,
}

impl RowSpans {
    pub fn compute(rows: &[ValidationRow]) -> Self {
        let mut by_feature = SpanIndex::default();
        let mut by_precondition = SpanIndex::default();
        for row in rows {
            for answer in &row.answers {
                by_feature.insert(answer.feature.id, answer.row_id);
                by_precondition.insert(answer.feature_precondition.id, answer.row_id);
            }
        }
        Self {
            by_feature,
            by_precondition,
        }
    }

    /// How many displayed rows the cell for `validation_type` visually
    /// covers in `row`.
    pub fn span_for(&self, validation_type: ValidationType, row: &ValidationRow) -> usize {
        match validation_type {
            ValidationType::Feature => self.by_feature.span_len(row.feature_id()),
            ValidationType::FeaturePrecondition
            | ValidationType::Stakeholder
            | ValidationType::Do => {
                let key = row
                    .answers
                    .first()
                    .map(|a| a.feature_precondition.id)
                    .unwrap_or(0);
                self.by_precondition.span_len(key)
            }
            _ => 1,
        }
    }

    /// True when `row` is the first row of its group and therefore displays
    /// the merged cell; later rows in the same group suppress it.
    pub fn displays_cell(&self, validation_type: ValidationType, row: &ValidationRow) -> bool {
        match validation_type {
            ValidationType::Feature => self.by_feature.is_anchor(row.feature_id(), row.row_id),
            ValidationType::FeaturePrecondition
            | ValidationType::Stakeholder
            | ValidationType::Do => {
                let key = row
                    .answers
                    .first()
                    .map(|a| a.feature_precondition.id)
                    .unwrap_or(0);
                self.by_precondition.is_anchor(key, row.row_id)
            }
            _ => true,
        }
    }
}
