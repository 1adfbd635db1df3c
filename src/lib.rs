//! PCB Risk: exposure scoring for maternal PCB measurements
//!
//! Turns a table of congener concentrations plus maternal age and
//! pre-pregnancy BMI into toxicokinetic dose and risk figures, a rule-based
//! risk tier, an optional ML second opinion and a per-patient explanation.
//!
//! ## Architecture
//!
//! - **Column Detector**: sample id, congener, age and BMI columns by name
//! - **Toxicokinetics**: ADD / LADD / HQ / CR and the rule-based tier
//! - **ML Engine**: classifier artifact, lazy loader service, status blending
//! - **Pipeline**: batch analysis, summary, statistics, clinician digest
//! - **Explain**: model-or-heuristic probability, contributions, narrative

pub mod config;
pub mod csv_input;
pub mod detection;
pub mod explain;
pub mod ml_engine;
pub mod pipeline;
pub mod toxicokinetics;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, RiskConfig};

// Re-export commonly used types
pub use types::{
    AnalysisStats, AnalysisSummary, CellValue, Dataset, DatasetError, ExplanationRecord,
    MlLabel, PatientExplanation, RiskLabel, RiskMetrics, RiskRow, RiskStatus,
};

// Re-export the core operations
pub use explain::{explain, ExplanationGenerator};
pub use ml_engine::{ModelArtifact, ModelLoader};
pub use pipeline::{analyze, AnalysisError, AnalysisReport, ClinicalDigest, DatasetAnalyzer};
pub use toxicokinetics::{compute_risk, RiskCalculator};
