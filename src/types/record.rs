//! Typed per-row record, built once at ingestion from a detected column layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CellValue, Dataset};

/// Canonical name of the sample identifier column after detection.
pub const SAMPLE_ID_COLUMN: &str = "sample_id";

/// Which columns of a dataset play which role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Sample identifier column
    pub sample_column: String,
    /// Congener concentration columns, in dataset order
    pub measurement_columns: Vec<String>,
    /// Resolved age column (first matching alias), if any
    pub age_column: Option<String>,
    /// Resolved body-mass-index column (first matching alias), if any
    pub bmi_column: Option<String>,
}

impl ColumnLayout {
    /// Whether a column carries one of the recognised roles.
    pub fn is_recognised(&self, column: &str) -> bool {
        column == self.sample_column
            || self.measurement_columns.iter().any(|c| c == column)
            || self.age_column.as_deref() == Some(column)
            || self.bmi_column.as_deref() == Some(column)
    }

    /// Follow a column rename in the age, BMI and measurement roles.
    pub fn rename_role(&mut self, from: &str, to: &str) {
        for role in [&mut self.age_column, &mut self.bmi_column] {
            if role.as_deref() == Some(from) {
                *role = Some(to.to_string());
            }
        }
        for column in &mut self.measurement_columns {
            if column == from {
                *column = to.to_string();
            }
        }
    }
}

/// One sample/patient row with its recognised fields pulled out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    /// Zero-based position in the input dataset
    pub row_index: usize,
    /// Raw identifier cell (kept verbatim so numeric ids survive)
    pub sample_id: CellValue,
    /// Age in years
    pub age: Option<f64>,
    /// Body-mass index in kg/m²
    pub bmi: Option<f64>,
    /// Sum of the numeric congener concentrations; undefined if none are numeric
    pub congener_total: Option<f64>,
    /// Unrecognised columns, carried through untouched
    pub extra: BTreeMap<String, CellValue>,
}

impl SampleRecord {
    /// Build the record for `row_index`. Cells that are missing or fail numeric
    /// coercion simply leave the corresponding field undefined.
    pub fn from_row(dataset: &Dataset, row_index: usize, layout: &ColumnLayout) -> Self {
        let numeric = |column: Option<&str>| {
            column
                .and_then(|c| dataset.cell(row_index, c))
                .and_then(CellValue::as_f64)
        };

        let congeners: Vec<f64> = layout
            .measurement_columns
            .iter()
            .filter_map(|c| dataset.cell(row_index, c).and_then(CellValue::as_f64))
            .collect();
        let congener_total = (!congeners.is_empty()).then(|| congeners.iter().sum());

        let extra = dataset
            .columns()
            .iter()
            .filter(|c| !layout.is_recognised(c))
            .filter_map(|c| dataset.cell(row_index, c).map(|v| (c.clone(), v.clone())))
            .collect();

        Self {
            row_index,
            sample_id: dataset
                .cell(row_index, &layout.sample_column)
                .cloned()
                .unwrap_or_default(),
            age: numeric(layout.age_column.as_deref()),
            bmi: numeric(layout.bmi_column.as_deref()),
            congener_total,
            extra,
        }
    }
}
