//! Dataset Analyzer
//!
//! Column detection → per-row dose/risk + tier (parallel) → ML blend →
//! summary and statistics. This is the entry point the CLI and any other
//! I/O glue call.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{RiskConfig, ThresholdConfig};
use crate::detection::ColumnDetector;
use crate::ml_engine::{BlendOutcome, MlBlender, ModelLoader};
use crate::toxicokinetics::RiskCalculator;
use crate::types::{
    finite, mean_defined, AnalysisStats, AnalysisSummary, CellValue, ColumnLayout, Dataset,
    DatasetError, MlLabel, RiskRow, RiskStatus, SampleRecord, COMPUTED_COLUMNS, SAMPLE_ID_COLUMN,
};

/// Dataset-level failures. These are the only errors analysis surfaces.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("no measurement columns found (expected column names containing '{marker}')")]
    NoMeasurementColumns { marker: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Result of one analysis call.
///
/// Serializes as `{"summary": …, "stats": …, "data": [rows]}`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: AnalysisSummary,
    pub stats: AnalysisStats,
    #[serde(rename = "data")]
    pub rows: Vec<RiskRow>,
    /// Detected layout, with the sample column already renamed
    #[serde(skip)]
    pub layout: ColumnLayout,
    #[serde(skip)]
    pub blend: BlendOutcome,
    /// Input header after renaming the sample column
    #[serde(skip)]
    pub input_columns: Vec<String>,
    /// Thresholds the rows were classified with
    #[serde(skip)]
    pub thresholds: ThresholdConfig,
}

impl AnalysisReport {
    pub fn ml_applied(&self) -> bool {
        self.blend.is_applied()
    }

    /// Header of the augmented table: the input columns followed by the
    /// computed ones. The ML columns appear only when the ML stage ran.
    pub fn output_columns(&self) -> Vec<String> {
        let ml_applied = self.ml_applied();
        self.input_columns
            .iter()
            .filter(|c| !COMPUTED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .chain(
                COMPUTED_COLUMNS
                    .iter()
                    .filter(|c| ml_applied || !matches!(**c, "ML_Prob" | "ML_Label"))
                    .map(|c| (*c).to_string()),
            )
            .collect()
    }

    /// The augmented table as a `Dataset`, row order preserved.
    pub fn to_dataset(&self) -> Result<Dataset, DatasetError> {
        let columns = self.output_columns();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.value(c).unwrap_or_default())
                    .collect()
            })
            .collect();
        Dataset::with_rows(columns, rows)
    }
}

/// Runs the full batch pipeline with an injected model loader.
#[derive(Debug, Clone)]
pub struct DatasetAnalyzer {
    detector: ColumnDetector,
    calculator: RiskCalculator,
    blender: MlBlender,
    loader: Arc<ModelLoader>,
}

impl DatasetAnalyzer {
    pub fn new(config: &RiskConfig, loader: Arc<ModelLoader>) -> Self {
        Self {
            detector: ColumnDetector::new(config.columns.clone()),
            calculator: RiskCalculator::from_config(config),
            blender: MlBlender,
            loader,
        }
    }

    /// Analyzer whose loader follows `config.model`.
    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config, Arc::new(ModelLoader::from_config(&config.model)))
    }

    pub fn loader(&self) -> &Arc<ModelLoader> {
        &self.loader
    }

    /// Analyse a dataset.
    ///
    /// Fails only when the dataset is empty or has no measurement columns.
    /// Bad rows become `Error` rows.
    pub fn analyze(&self, dataset: &Dataset) -> Result<AnalysisReport, AnalysisError> {
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let mut layout = self.detector.detect(dataset.columns());
        if layout.measurement_columns.is_empty() {
            return Err(AnalysisError::NoMeasurementColumns {
                marker: self.detector.config().measurement_marker.clone(),
            });
        }

        let mut data = dataset.clone();
        assign_sample_id(&mut data, &mut layout)?;

        info!(
            rows = data.len(),
            measurements = layout.measurement_columns.len(),
            age = ?layout.age_column,
            bmi = ?layout.bmi_column,
            "Analyzing dataset"
        );

        let mut rows: Vec<RiskRow> = (0..data.len())
            .into_par_iter()
            .map(|i| self.evaluate(&data, i, &layout))
            .collect();

        let blend = self.blender.blend(&mut rows, self.loader.artifact());
        let summary = summarize(&rows, blend.is_applied());
        let stats = statistics(&rows, blend.is_applied());

        info!(
            total = summary.total_samples,
            errors = summary.status_distribution.get(&RiskStatus::Error).copied().unwrap_or(0),
            ml = blend.is_applied(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            summary,
            stats,
            rows,
            layout,
            blend,
            input_columns: data.columns().to_vec(),
            thresholds: self.calculator.thresholds().clone(),
        })
    }

    fn evaluate(&self, data: &Dataset, index: usize, layout: &ColumnLayout) -> RiskRow {
        let record = SampleRecord::from_row(data, index, layout);

        let (metrics, status) = match self.calculator.assess(&record) {
            Ok(metrics) => (Some(metrics), self.calculator.classify(&metrics)),
            Err(e) => {
                debug!(error = %e, "Row marked Error");
                (None, RiskStatus::Error)
            }
        };

        let inputs: BTreeMap<String, CellValue> = data
            .row_map(index)
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, _)| name != SAMPLE_ID_COLUMN && !COMPUTED_COLUMNS.contains(&name.as_str()))
            .collect();

        RiskRow {
            row_index: index,
            sample_id: record.sample_id,
            inputs,
            total_pcb: record.congener_total.and_then(finite),
            add: metrics.and_then(|m| finite(m.average_daily_dose)),
            ladd: metrics.and_then(|m| finite(m.lifetime_average_daily_dose)),
            hq: metrics.and_then(|m| finite(m.hazard_quotient)),
            cr: metrics.and_then(|m| finite(m.cancer_risk)),
            status,
            ml: None,
            final_status: status,
        }
    }
}

impl Default for DatasetAnalyzer {
    fn default() -> Self {
        Self::new(&RiskConfig::default(), Arc::new(ModelLoader::disabled()))
    }
}

/// Analyse with the built-in constants and no classifier.
pub fn analyze(dataset: &Dataset) -> Result<AnalysisReport, AnalysisError> {
    DatasetAnalyzer::default().analyze(dataset)
}

/// Expose the detected identifier as `sample_id` without losing a column.
///
/// An input column already called `sample_id` is kept under a new name. A
/// detected column that is also a congener column is copied, so it stays in
/// the congener sum.
fn assign_sample_id(data: &mut Dataset, layout: &mut ColumnLayout) -> Result<(), DatasetError> {
    let detected = std::mem::take(&mut layout.sample_column);
    layout.sample_column = SAMPLE_ID_COLUMN.to_string();
    if detected == SAMPLE_ID_COLUMN {
        return Ok(());
    }

    if data.has_column(SAMPLE_ID_COLUMN) {
        let kept = data.unused_column_name(&format!("{SAMPLE_ID_COLUMN}_original"));
        warn!(sample = %detected, kept = %kept, "Input sample_id column renamed");
        data.rename_column(SAMPLE_ID_COLUMN, &kept)?;
        layout.rename_role(SAMPLE_ID_COLUMN, &kept);
    }

    if layout.measurement_columns.contains(&detected) {
        warn!(column = %detected, "Sample column is a congener column; copied to sample_id");
        data.copy_column(&detected, SAMPLE_ID_COLUMN)
    } else {
        data.rename_column(&detected, SAMPLE_ID_COLUMN)?;
        layout.rename_role(&detected, SAMPLE_ID_COLUMN);
        Ok(())
    }
}

fn summarize(rows: &[RiskRow], ml_applied: bool) -> AnalysisSummary {
    let mut status_distribution: BTreeMap<RiskStatus, usize> = BTreeMap::new();
    for row in rows {
        *status_distribution.entry(row.final_status).or_default() += 1;
    }

    let ml_label_distribution = ml_applied.then(|| {
        let mut labels: BTreeMap<MlLabel, usize> = BTreeMap::new();
        for ml in rows.iter().filter_map(|r| r.ml) {
            *labels.entry(ml.label).or_default() += 1;
        }
        labels
    });

    AnalysisSummary {
        total_samples: rows.len(),
        status_distribution,
        ml_label_distribution,
    }
}

fn statistics(rows: &[RiskRow], ml_applied: bool) -> AnalysisStats {
    AnalysisStats {
        mean_add: mean_defined(rows.iter().map(|r| r.add)),
        mean_ladd: mean_defined(rows.iter().map(|r| r.ladd)),
        mean_hq: mean_defined(rows.iter().map(|r| r.hq)),
        mean_cr: mean_defined(rows.iter().map(|r| r.cr)),
        mean_ml_prob: if ml_applied {
            mean_defined(rows.iter().map(|r| r.ml.and_then(|m| m.probability)))
        } else {
            None
        },
    }
}
