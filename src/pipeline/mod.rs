//! Batch Analysis Pipeline
//!
//! ```text
//! Dataset
//!   → Column detection (sample id, congeners, age, BMI)
//!   → Per-row dose/risk + rule tier (parallel, row-isolated)
//!   → ML blend (optional, degrades to rules only)
//!   → Summary + stats
//!   → Clinician digest (optional view)
//! ```
//!
//! Only dataset-level structural problems fail the call; a bad row becomes
//! an `Error` row and processing continues.

mod analyzer;
mod digest;

pub use analyzer::{analyze, AnalysisError, AnalysisReport, DatasetAnalyzer};
pub use digest::{ClinicalDigest, CriticalCase, DigestOverview};
