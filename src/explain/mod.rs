//! Explanation Generator
//!
//! Turns one patient's maternal age and pre-pregnancy BMI into a probability
//! of belonging to the high PCB risk group, per-input contributions, a label
//! and a narrative.
//!
//! ## Degradation chain
//! 1. Age or BMI missing → `MissingInputs`, no probability
//! 2. Classifier available and prediction succeeds → `Model`
//! 3. Otherwise → logistic `Heuristic`
//!
//! Contributions on the model path are one-at-a-time finite differences
//! against the reference patient (age 30, BMI 25 by default), not Shapley
//! values.
//!
//! ## Architecture
//! - `narrative`: summary templates, offline clinical note, `%g`-style
//!   number formatting

pub mod narrative;

pub use narrative::{clinical_note, format_significant};

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::defaults::PATIENT_ID_COLUMN;
use crate::config::{ColumnConfig, ExplanationConfig, RiskConfig};
use crate::detection::resolve_first;
use crate::ml_engine::{ModelArtifact, ModelLoader, PredictionError};
use crate::types::{
    finite, finite_opt, CellValue, Dataset, ExplanationInputs, ExplanationRecord,
    ExplanationSource, FeatureContributions, PatientExplanation, RiskLabel, SAMPLE_ID_COLUMN,
};

/// Probability and contributions before labelling.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Estimate {
    probability: Option<f64>,
    contributions: FeatureContributions,
    source: ExplanationSource,
}

/// Explains patients with an injected model loader.
#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    settings: ExplanationConfig,
    age_aliases: Vec<String>,
    bmi_aliases: Vec<String>,
    loader: Arc<ModelLoader>,
}

impl ExplanationGenerator {
    pub fn new(config: &RiskConfig, loader: Arc<ModelLoader>) -> Self {
        Self::with_columns(&config.columns, config.explanation.clone(), loader)
    }

    pub fn with_columns(
        columns: &ColumnConfig,
        settings: ExplanationConfig,
        loader: Arc<ModelLoader>,
    ) -> Self {
        Self {
            settings,
            age_aliases: columns.age_aliases.clone(),
            bmi_aliases: columns.explain_bmi_aliases.clone(),
            loader,
        }
    }

    /// Generator whose loader follows `config.model`.
    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config, Arc::new(ModelLoader::from_config(&config.model)))
    }

    pub fn loader(&self) -> &Arc<ModelLoader> {
        &self.loader
    }

    /// Explain one record given as column name → cell.
    ///
    /// Age and BMI are the first alias with a numeric value. `HQ` and `CR`
    /// are carried through when the record has them. Never fails.
    pub fn explain(&self, record: &BTreeMap<String, CellValue>) -> ExplanationRecord {
        let numeric = |name: &str| record.get(name).and_then(CellValue::as_f64);
        let age = resolve_first(&self.age_aliases, numeric).map(|(_, v)| v);
        let bmi = resolve_first(&self.bmi_aliases, numeric).map(|(_, v)| v);

        let mut explanation = self.explain_inputs(age, bmi);
        explanation.hq = numeric("HQ");
        explanation.cr = numeric("CR");
        explanation
    }

    /// Explain a patient from age and BMI directly.
    pub fn explain_inputs(&self, age: Option<f64>, bmi: Option<f64>) -> ExplanationRecord {
        let inputs = ExplanationInputs {
            age: finite_opt(age),
            bmi: finite_opt(bmi),
        };

        let (Some(age), Some(bmi)) = (inputs.age, inputs.bmi) else {
            debug!(age = ?inputs.age, bmi = ?inputs.bmi, "Missing age/BMI, no estimate");
            return ExplanationRecord {
                risk_probability: None,
                risk_label: RiskLabel::MissingInputs,
                inputs,
                shap_values: FeatureContributions::default(),
                hq: None,
                cr: None,
                summary: narrative::MISSING_INPUTS_SUMMARY.to_string(),
                source: ExplanationSource::MissingInputs,
            };
        };

        let estimate = match self.loader.artifact() {
            Some(artifact) => self.model_estimate(artifact, age, bmi).unwrap_or_else(|e| {
                warn!(error = %e, "Model explanation failed, using heuristic");
                self.heuristic_estimate(age, bmi)
            }),
            None => self.heuristic_estimate(age, bmi),
        };

        let probability = finite_opt(estimate.probability);
        let shap_values = FeatureContributions {
            age: finite_opt(estimate.contributions.age),
            bmi: finite_opt(estimate.contributions.bmi),
        };
        let summary = narrative::compose_summary(
            probability,
            &inputs,
            &shap_values,
            self.settings.reference_age,
            self.settings.reference_bmi,
        );

        ExplanationRecord {
            risk_probability: probability,
            risk_label: self.risk_label(probability),
            inputs,
            shap_values,
            hq: None,
            cr: None,
            summary,
            source: estimate.source,
        }
    }

    /// Explain every row of a dataset, in row order.
    ///
    /// `patient_id` comes from `sample_id`, else `patient_id`, else the
    /// 1-based row number.
    pub fn explain_dataset(&self, dataset: &Dataset) -> Vec<PatientExplanation> {
        // Resolve the classifier once, before fanning out
        let available = self.loader.is_available();
        info!(rows = dataset.len(), model = available, "Explaining dataset");

        (0..dataset.len())
            .into_par_iter()
            .map(|index| {
                let record = dataset.row_map(index).unwrap_or_default();
                let patient_id = [SAMPLE_ID_COLUMN, PATIENT_ID_COLUMN]
                    .iter()
                    .find_map(|column| record.get(*column).and_then(CellValue::as_text))
                    .unwrap_or_else(|| (index + 1).to_string());
                PatientExplanation {
                    patient_id,
                    explanation: self.explain(&record),
                }
            })
            .collect()
    }

    /// Label from `P * 100`.
    pub fn risk_label(&self, probability: Option<f64>) -> RiskLabel {
        let Some(pct) = probability.and_then(|p| finite(p * 100.0)) else {
            return RiskLabel::Unknown;
        };
        if pct >= self.settings.high_risk_percent {
            RiskLabel::High
        } else if pct >= self.settings.borderline_risk_percent {
            RiskLabel::Borderline
        } else {
            RiskLabel::Low
        }
    }

    fn heuristic_estimate(&self, age: f64, bmi: f64) -> Estimate {
        let s = &self.settings;
        let age_term = s.age_weight * (age - s.reference_age);
        let bmi_term = s.bmi_weight * (bmi - s.reference_bmi);
        let z = age_term + bmi_term;
        Estimate {
            probability: Some(1.0 / (1.0 + (-z).exp())),
            contributions: FeatureContributions {
                age: Some(age_term),
                bmi: Some(bmi_term),
            },
            source: ExplanationSource::Heuristic,
        }
    }

    fn model_estimate(
        &self,
        artifact: &ModelArtifact,
        age: f64,
        bmi: f64,
    ) -> Result<Estimate, PredictionError> {
        let ref_age = self.settings.reference_age;
        let ref_bmi = self.settings.reference_bmi;
        let predict = |a: f64, b: f64| -> Result<f64, PredictionError> {
            artifact.predict_proba(&self.feature_vector(artifact, a, b)?)
        };

        let probability = predict(age, bmi)?;
        let baseline = predict(ref_age, ref_bmi)?;
        let age_only = predict(age, ref_bmi)?;
        let bmi_only = predict(ref_age, bmi)?;

        Ok(Estimate {
            probability: Some(probability),
            contributions: FeatureContributions {
                age: Some(age_only - baseline),
                bmi: Some(bmi_only - baseline),
            },
            source: ExplanationSource::Model,
        })
    }

    /// Features in artifact order: age and BMI by alias, anything else from
    /// the artifact medians.
    fn feature_vector(
        &self,
        artifact: &ModelArtifact,
        age: f64,
        bmi: f64,
    ) -> Result<Vec<f64>, PredictionError> {
        artifact
            .feature_names()
            .iter()
            .map(|name| {
                if self.age_aliases.iter().any(|a| a == name) {
                    Ok(age)
                } else if self.bmi_aliases.iter().any(|a| a == name) {
                    Ok(bmi)
                } else {
                    artifact
                        .feature_median(name)
                        .ok_or_else(|| PredictionError::MissingFeature(name.clone()))
                }
            })
            .collect()
    }
}

impl Default for ExplanationGenerator {
    fn default() -> Self {
        Self::new(&RiskConfig::default(), Arc::new(ModelLoader::disabled()))
    }
}

/// Explain with the built-in constants and no classifier.
pub fn explain(record: &BTreeMap<String, CellValue>) -> ExplanationRecord {
    ExplanationGenerator::default().explain(record)
}
