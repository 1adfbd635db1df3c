//! Explanation Generator Tests
//!
//! Heuristic fallback, model path, missing inputs and the batch/offline
//! note helpers, all through the public API.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use pcb_risk::config::RiskConfig;
use pcb_risk::explain::{clinical_note, explain, ExplanationGenerator};
use pcb_risk::ml_engine::{ModelArtifact, ModelLoader};
use pcb_risk::types::{CellValue, Dataset, ExplanationSource, RiskLabel};

fn record(pairs: &[(&str, CellValue)]) -> BTreeMap<String, CellValue> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

#[test]
fn heuristic_for_age_40_bmi_30() {
    let out = explain(&record(&[("Maternal age", 40.0.into()), ("BMI", 30.0.into())]));
    let p = out.risk_probability.unwrap();
    assert!((p - 0.7109).abs() < 1e-4, "got {p}");
    assert_eq!(out.risk_label, RiskLabel::Borderline);
    assert_eq!(out.source, ExplanationSource::Heuristic);
    assert!(out.summary.starts_with(
        "Based on maternal age and pre-pregnancy BMI, this patient has an estimated 71% probability"
    ));
    assert!(out.summary.contains("A maternal age of 40.0 years increases risk"));
    assert!(out.summary.contains("BMI of 30.0 increases risk compared with BMI 25."));
}

#[test]
fn high_and_low_labels() {
    let high = explain(&record(&[("m_age", 45.0.into()), ("bmi", 40.0.into())]));
    assert_eq!(high.risk_label, RiskLabel::High);
    let low = explain(&record(&[("m_age", 22.0.into()), ("bmi", 19.0.into())]));
    assert_eq!(low.risk_label, RiskLabel::Low);
    assert!(low.summary.contains("decreases risk compared with a reference of 30 years"));
}

#[test]
fn missing_age_returns_structured_result() {
    let out = explain(&record(&[("bmi", 22.0.into())]));
    assert_eq!(out.risk_label, RiskLabel::MissingInputs);
    assert!(out.risk_probability.is_none());
    assert!(out.shap_values.age.is_none() && out.shap_values.bmi.is_none());
    assert!(out.summary.contains("missing"));

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["risk_label"], "Unknown (missing age/BMI)");
    assert!(json["risk_probability"].is_null());
}

#[test]
fn unreadable_artifact_falls_back_to_heuristic() {
    let loader = Arc::new(ModelLoader::from_path("/nonexistent/model.json"));
    let generator = ExplanationGenerator::new(&RiskConfig::default(), loader);
    let out = generator.explain_inputs(Some(40.0), Some(30.0));
    assert_eq!(out.source, ExplanationSource::Heuristic);
    assert!((out.risk_probability.unwrap() - 0.7109).abs() < 1e-4);
}

#[test]
fn model_contributions_are_one_at_a_time_differences() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"{"feature_names": ["prepregancy_bmi", "m_age"],
             "model": {"kind": "random_forest", "trees": [[
                {"feature": 1, "threshold": 35.0, "left": 1, "right": 2},
                {"probability": 0.1},
                {"feature": 0, "threshold": 27.0, "left": 3, "right": 4},
                {"probability": 0.6},
                {"probability": 0.95}
             ]]}}"#,
    )
    .unwrap();
    let mut config = RiskConfig::default();
    config.model.artifact_path = Some(file.path().to_path_buf());
    let generator = ExplanationGenerator::from_config(&config);

    let out = generator.explain_inputs(Some(38.0), Some(31.0));
    assert_eq!(out.source, ExplanationSource::Model);
    assert_eq!(out.risk_probability, Some(0.95));
    assert_eq!(out.risk_label, RiskLabel::High);
    // baseline (30, 25) = 0.1; age only (38, 25) = 0.6; BMI only (30, 31) = 0.1
    assert!((out.shap_values.age.unwrap() - 0.5).abs() < 1e-12);
    assert_eq!(out.shap_values.bmi, Some(0.0));
    assert!(out.summary.contains("BMI of 31.0 decreases risk"));
}

#[test]
fn injected_classifier_is_used() {
    let artifact = ModelArtifact::from_json_str(
        r#"{"feature_names": ["m_age", "prepregnancy_bmi"],
            "model": {"kind": "logistic", "coefficients": [0.0, 0.0], "intercept": -20.0}}"#,
    )
    .unwrap();
    let generator = ExplanationGenerator::new(
        &RiskConfig::default(),
        Arc::new(ModelLoader::preloaded(artifact)),
    );
    let out = generator.explain_inputs(Some(40.0), Some(30.0));
    assert_eq!(out.risk_label, RiskLabel::Low);
    assert_eq!(out.shap_values.age, Some(0.0));
}

#[test]
fn dataset_explanations_follow_row_order() {
    let ds = Dataset::with_rows(
        ["sample_id", "m_age", "prepregancy_bmi", "HQ", "CR"],
        vec![
            vec!["S-9".into(), 40.0.into(), 30.0.into(), 1.674_107.into(), 2.87e-5.into()],
            vec![CellValue::Missing, "n/a".into(), 24.0.into(), CellValue::Missing, CellValue::Missing],
            vec![17.0.into(), 29.0.into(), 21.0.into(), 0.05.into(), 1e-7.into()],
        ],
    )
    .unwrap();
    let patients = ExplanationGenerator::default().explain_dataset(&ds);
    let ids: Vec<&str> = patients.iter().map(|p| p.patient_id.as_str()).collect();
    assert_eq!(ids, vec!["S-9", "2", "17"]);
    assert_eq!(patients[1].explanation.risk_label, RiskLabel::MissingInputs);

    let note = clinical_note(&patients[0].explanation);
    assert!(note.contains("Borderline risk"));
    assert!(note.contains("(HQ) ≈ 1.67."));
    assert!(note.contains("(CR) ≈ 2.87e-05."));

    let json = serde_json::to_value(&patients[0]).unwrap();
    assert_eq!(json["patient_id"], "S-9");
    assert_eq!(json["inputs"]["m_age"], 40.0);
    assert!(json["shap_values"]["prepregnancy_bmi"].is_number());
}
