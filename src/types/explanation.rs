//! Per-patient explanation record

use serde::{Deserialize, Serialize};

/// Qualitative label derived from the high-risk probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "High risk")]
    High,
    #[serde(rename = "Borderline risk")]
    Borderline,
    #[serde(rename = "Low risk")]
    Low,
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "Unknown (missing age/BMI)")]
    MissingInputs,
}

impl RiskLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High risk",
            Self::Borderline => "Borderline risk",
            Self::Low => "Low risk",
            Self::Unknown => "Unknown",
            Self::MissingInputs => "Unknown (missing age/BMI)",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the probability in an explanation was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    /// Trained classifier
    Model,
    /// Logistic heuristic (no classifier, or the classifier failed)
    Heuristic,
    /// Age or BMI absent; no probability computed
    MissingInputs,
}

/// Age and BMI exactly as received.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExplanationInputs {
    #[serde(rename = "m_age")]
    pub age: Option<f64>,
    #[serde(rename = "prepregnancy_bmi")]
    pub bmi: Option<f64>,
}

/// One-at-a-time contribution of each input relative to the reference patient.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureContributions {
    #[serde(rename = "m_age")]
    pub age: Option<f64>,
    #[serde(rename = "prepregnancy_bmi")]
    pub bmi: Option<f64>,
}

/// Explanation of one patient's risk. All floats are finite or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    pub risk_probability: Option<f64>,
    pub risk_label: RiskLabel,
    pub inputs: ExplanationInputs,
    pub shap_values: FeatureContributions,
    pub hq: Option<f64>,
    pub cr: Option<f64>,
    pub summary: String,
    pub source: ExplanationSource,
}

/// Explanation tagged with the patient it belongs to (batch output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientExplanation {
    pub patient_id: String,
    #[serde(flatten)]
    pub explanation: ExplanationRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_names() {
        let record = ExplanationRecord {
            risk_probability: None,
            risk_label: RiskLabel::MissingInputs,
            inputs: ExplanationInputs { age: Some(31.0), bmi: None },
            shap_values: FeatureContributions::default(),
            hq: Some(f64::INFINITY),
            cr: None,
            summary: String::new(),
            source: ExplanationSource::MissingInputs,
        };
        let value = serde_json::to_value(PatientExplanation {
            patient_id: "7".into(),
            explanation: record,
        })
        .unwrap();
        assert_eq!(value["patient_id"], "7");
        assert_eq!(value["risk_label"], "Unknown (missing age/BMI)");
        assert_eq!(value["inputs"]["m_age"], 31.0);
        assert!(value["inputs"]["prepregnancy_bmi"].is_null());
        assert!(value["shap_values"]["m_age"].is_null());
        assert!(value["hq"].is_null());
        assert_eq!(value["source"], "missing_inputs");
    }
}
