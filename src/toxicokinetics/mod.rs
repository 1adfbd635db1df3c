//! Toxicokinetic Risk Engine
//!
//! Deterministic dose and risk arithmetic for PCB exposure. No ML here.
//!
//! - `compute_risk()` - single-patient calculator with the published constants
//! - `classify()` - HQ/CR → rule-based tier
//! - `RiskCalculator` - the same two steps driven by a `RiskConfig`, applied
//!   to typed `SampleRecord`s with per-row error isolation

mod classify;
mod dose;

pub use classify::classify;
pub use dose::{compute_risk_with, estimate_body_weight};

use thiserror::Error;

use crate::config::{ExposureConfig, RiskConfig, ThresholdConfig};
use crate::types::thresholds::exposure_constants::DEFAULT_WEEKLY_INTAKE_G;
use crate::types::{RiskMetrics, RiskStatus, SampleRecord};

/// Dose and risk for one patient using the built-in constants.
///
/// `weekly_intake` is in g/week; the reference value is 150.
pub fn compute_risk(age: f64, bmi: f64, congener_sum: f64, weekly_intake: f64) -> RiskMetrics {
    compute_risk_with(
        &ExposureConfig::default(),
        &ThresholdConfig::default(),
        age,
        bmi,
        congener_sum,
        weekly_intake,
    )
}

/// [`compute_risk`] at the reference intake of 150 g/week.
pub fn compute_risk_default_intake(age: f64, bmi: f64, congener_sum: f64) -> RiskMetrics {
    compute_risk(age, bmi, congener_sum, DEFAULT_WEEKLY_INTAKE_G)
}

// ============================================================================
// Per-row computation
// ============================================================================

/// Input the risk formula needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskInput {
    Age,
    Bmi,
    CongenerTotal,
}

impl std::fmt::Display for RiskInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Age => "age",
            Self::Bmi => "BMI",
            Self::CongenerTotal => "congener total",
        })
    }
}

/// A row whose risk cannot be computed. Recovered locally as `Error` status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowComputationError {
    #[error("row {row}: missing or non-numeric {input}")]
    MissingInput { row: usize, input: RiskInput },
}

/// Configured dose model plus classifier.
#[derive(Debug, Clone, Default)]
pub struct RiskCalculator {
    exposure: ExposureConfig,
    thresholds: ThresholdConfig,
}

impl RiskCalculator {
    pub fn new(exposure: ExposureConfig, thresholds: ThresholdConfig) -> Self {
        Self { exposure, thresholds }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.exposure.clone(), config.thresholds.clone())
    }

    /// Metrics at the configured weekly intake.
    pub fn compute(&self, age: f64, bmi: f64, congener_sum: f64) -> RiskMetrics {
        compute_risk_with(
            &self.exposure,
            &self.thresholds,
            age,
            bmi,
            congener_sum,
            self.exposure.weekly_intake_g,
        )
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn classify(&self, metrics: &RiskMetrics) -> RiskStatus {
        classify(metrics.hazard_quotient, metrics.cancer_risk, &self.thresholds)
    }

    /// Metrics for a record, or the first missing input.
    pub fn assess(&self, record: &SampleRecord) -> Result<RiskMetrics, RowComputationError> {
        let missing = |input| RowComputationError::MissingInput {
            row: record.row_index,
            input,
        };
        let age = record.age.ok_or_else(|| missing(RiskInput::Age))?;
        let bmi = record.bmi.ok_or_else(|| missing(RiskInput::Bmi))?;
        let total = record
            .congener_total
            .ok_or_else(|| missing(RiskInput::CongenerTotal))?;
        Ok(self.compute(age, bmi, total))
    }
}
