//! ML Blender
//!
//! Scores analysed rows with the classifier artifact and folds the resulting
//! label into `Final_Status`. Every degraded path is reported through
//! [`BlendOutcome`] instead of an error.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::artifact::{ModelArtifact, PredictionError};
use crate::types::{median_defined, CellValue, MlAssessment, MlLabel, RiskRow, RiskStatus};

/// Why the ML stage did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoArtifact,
    /// Artifact features absent from the dataset
    MissingFeatures(Vec<String>),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoArtifact => f.write_str("no model artifact available"),
            Self::MissingFeatures(missing) => {
                write!(f, "dataset lacks model features: {}", missing.join(", "))
            }
        }
    }
}

/// What the ML stage did to a batch of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlendOutcome {
    /// Rows were scored; `unscored` rows kept label `Unknown`.
    Applied { scored: usize, unscored: usize },
    /// `Final_Status` copied from `Status`; no ML columns.
    Skipped(SkipReason),
}

impl BlendOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Combine the rule-based status with an ML label.
///
/// A high ML label escalates `Safe` to `Needs Monitoring (ML)` and
/// `Needs Monitoring` to `Critical Risk (ML)`; any other base status becomes
/// `Critical Risk` (this includes `Error` rows). Low and unknown labels keep
/// the base status.
pub fn combine_status(base: RiskStatus, label: MlLabel) -> RiskStatus {
    match (label, base) {
        (MlLabel::High, RiskStatus::Safe) => RiskStatus::NeedsMonitoringMl,
        (MlLabel::High, RiskStatus::NeedsMonitoring) => RiskStatus::CriticalRiskMl,
        (MlLabel::High, _) => RiskStatus::CriticalRisk,
        (MlLabel::Low | MlLabel::Unknown, base) => base,
    }
}

/// Applies an optional artifact to analysed rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlBlender;

impl MlBlender {
    /// Fill `ml` and `final_status` on every row.
    pub fn blend(&self, rows: &mut [RiskRow], artifact: Option<&ModelArtifact>) -> BlendOutcome {
        let Some(artifact) = artifact else {
            Self::copy_status(rows);
            debug!("No model artifact, Final_Status = Status");
            return BlendOutcome::Skipped(SkipReason::NoArtifact);
        };

        let missing: Vec<String> = artifact
            .feature_names()
            .iter()
            .filter(|f| !rows.first().is_some_and(|r| r.has_column(f)))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Missing model features in dataset, skipping ML");
            Self::copy_status(rows);
            return BlendOutcome::Skipped(SkipReason::MissingFeatures(missing));
        }

        let matrix = Self::feature_matrix(rows, artifact);

        let assessments: Vec<MlAssessment> = matrix
            .par_iter()
            .map(|features| match features {
                Some(x) => Self::score(artifact, x),
                None => MlAssessment::UNSCORED,
            })
            .collect();

        let mut scored = 0;
        for (row, ml) in rows.iter_mut().zip(assessments) {
            if ml.probability.is_some() {
                scored += 1;
            }
            row.final_status = combine_status(row.status, ml.label);
            row.ml = Some(ml);
        }
        let unscored = rows.len() - scored;

        info!(scored, unscored, threshold = artifact.threshold(), "ML blend applied");
        BlendOutcome::Applied { scored, unscored }
    }

    fn copy_status(rows: &mut [RiskRow]) {
        for row in rows {
            row.ml = None;
            row.final_status = row.status;
        }
    }

    /// Per-row feature vectors in artifact order after imputation; `None`
    /// for rows where some feature stays undefined.
    fn feature_matrix(rows: &[RiskRow], artifact: &ModelArtifact) -> Vec<Option<Vec<f64>>> {
        let columns: Vec<Vec<Option<f64>>> = artifact
            .feature_names()
            .iter()
            .map(|feature| {
                let raw: Vec<Option<f64>> = rows
                    .iter()
                    .map(|r| r.value(feature).as_ref().and_then(CellValue::as_f64))
                    .collect();
                let fill = artifact
                    .feature_median(feature)
                    .or_else(|| median_defined(raw.iter().copied()));
                if fill.is_none() {
                    debug!(feature = %feature, "No imputation value for feature");
                }
                raw.into_iter().map(|v| v.or(fill)).collect()
            })
            .collect();

        (0..rows.len())
            .map(|i| columns.iter().map(|col| col[i]).collect::<Option<Vec<f64>>>())
            .collect()
    }

    fn score(artifact: &ModelArtifact, features: &[f64]) -> MlAssessment {
        match artifact.predict_proba(features) {
            Ok(p) => MlAssessment {
                probability: Some(p),
                label: MlLabel::from_probability(p, artifact.threshold()),
            },
            Err(e) => {
                Self::log_failure(&e);
                MlAssessment::UNSCORED
            }
        }
    }

    fn log_failure(error: &PredictionError) {
        warn!(error = %error, "Prediction failed for row, leaving ML label Unknown");
    }
}
