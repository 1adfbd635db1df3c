//! Computed risk quantities, per-row results and dataset aggregates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CellValue, MlLabel, RiskStatus, SAMPLE_ID_COLUMN};

/// Output of the toxicokinetic dose/risk formula for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Non-cancer hazard quotient (dimensionless)
    pub hazard_quotient: f64,
    /// Lifetime cancer risk probability
    pub cancer_risk: f64,
    /// HQ + CR
    pub total_risk: f64,
    /// HQ or CR above its critical bound
    pub high_risk: bool,
    /// Average daily dose (mg/kg-day)
    pub average_daily_dose: f64,
    /// Lifetime average daily dose (mg/kg-day)
    pub lifetime_average_daily_dose: f64,
}

/// ML probability and its label for one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlAssessment {
    #[serde(rename = "ML_Prob")]
    pub probability: Option<f64>,
    #[serde(rename = "ML_Label")]
    pub label: MlLabel,
}

impl MlAssessment {
    pub const UNSCORED: Self = Self {
        probability: None,
        label: MlLabel::Unknown,
    };
}

/// One analysed row: the input cells plus every computed field.
///
/// Serializes flat, with the column names used by the tabular output
/// (`Total_PCB`, `ADD`, `LADD`, `HQ`, `CR`, `Status`, `ML_Prob`, `ML_Label`,
/// `Final_Status`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRow {
    #[serde(skip)]
    pub row_index: usize,
    pub sample_id: CellValue,
    /// Input cells other than the identifier and the computed columns
    #[serde(flatten)]
    pub inputs: BTreeMap<String, CellValue>,
    #[serde(rename = "Total_PCB")]
    pub total_pcb: Option<f64>,
    #[serde(rename = "ADD")]
    pub add: Option<f64>,
    #[serde(rename = "LADD")]
    pub ladd: Option<f64>,
    #[serde(rename = "HQ")]
    pub hq: Option<f64>,
    #[serde(rename = "CR")]
    pub cr: Option<f64>,
    #[serde(rename = "Status")]
    pub status: RiskStatus,
    #[serde(flatten)]
    pub ml: Option<MlAssessment>,
    #[serde(rename = "Final_Status")]
    pub final_status: RiskStatus,
}

impl RiskRow {
    /// Cell under `column` in the tabular rendering of this row.
    ///
    /// `None` when the row has no such column; the ML columns exist only
    /// once a probability stage has run.
    pub fn value(&self, column: &str) -> Option<CellValue> {
        let cell = match column {
            SAMPLE_ID_COLUMN => self.sample_id.clone(),
            "Total_PCB" => self.total_pcb.into(),
            "ADD" => self.add.into(),
            "LADD" => self.ladd.into(),
            "HQ" => self.hq.into(),
            "CR" => self.cr.into(),
            "Status" => self.status.as_str().into(),
            "ML_Prob" => self.ml?.probability.into(),
            "ML_Label" => self.ml?.label.as_str().into(),
            "Final_Status" => self.final_status.as_str().into(),
            other => return self.inputs.get(other).cloned(),
        };
        Some(cell)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.value(column).is_some()
    }
}

/// Names of the columns the pipeline writes.
pub const COMPUTED_COLUMNS: [&str; 9] = [
    "Total_PCB",
    "ADD",
    "LADD",
    "HQ",
    "CR",
    "Status",
    "ML_Prob",
    "ML_Label",
    "Final_Status",
];

/// Counts per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_samples: usize,
    /// Distribution of `Final_Status`
    pub status_distribution: BTreeMap<RiskStatus, usize>,
    /// Distribution of `ML_Label`; present only when the ML stage ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_label_distribution: Option<BTreeMap<MlLabel, usize>>,
}

/// Means over the defined values of each computed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    #[serde(rename = "mean_ADD")]
    pub mean_add: Option<f64>,
    #[serde(rename = "mean_LADD")]
    pub mean_ladd: Option<f64>,
    #[serde(rename = "mean_HQ")]
    pub mean_hq: Option<f64>,
    #[serde(rename = "mean_CR")]
    pub mean_cr: Option<f64>,
    /// Present only when the ML stage ran
    #[serde(rename = "mean_ML_Prob", default, skip_serializing_if = "Option::is_none")]
    pub mean_ml_prob: Option<f64>,
}
