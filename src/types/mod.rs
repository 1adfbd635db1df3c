//! Shared data structures for the PCB exposure risk pipeline
//!
//! This module defines the core types passed between pipeline stages:
//! - Input: `CellValue`, `Dataset` (loosely typed tabular rows)
//! - Ingestion: `ColumnLayout`, `SampleRecord` (typed per-row record)
//! - Risk outputs: `RiskMetrics`, `RiskStatus`, `MlLabel`, `RiskRow`
//! - Aggregates: `AnalysisSummary`, `AnalysisStats`
//! - Explanations: `ExplanationRecord`, `PatientExplanation`

mod dataset;
mod explanation;
mod numeric;
mod record;
mod risk;
mod status;
// Public so the constant tables stay addressable as `types::thresholds::...`.
pub mod thresholds;

pub use dataset::*;
pub use explanation::*;
pub use numeric::*;
pub use record::*;
pub use risk::*;
pub use status::*;
