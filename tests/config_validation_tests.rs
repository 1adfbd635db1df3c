//! Config Validation Tests
//!
//! Typo detection, consistency validation and file loading of `RiskConfig`,
//! exercised independently from the pipeline.

use std::io::Write;

use pcb_risk::config::validation::{
    known_config_keys, plausibility_warnings, suggest_correction, validate_unknown_keys,
};
use pcb_risk::config::{ConfigError, RiskConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_threshold_warns_with_suggestion() {
    let toml_str = r#"
[thresholds]
hq_critcal = 2.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "thresholds.hq_critcal");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("thresholds.hq_critical"));
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let warnings = validate_unknown_keys("[server]\naddr = \"0.0.0.0:8080\"\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[exposure]
weekly_intake_g = 200.0
assumed_height_m = 1.65
lifetime_years = 75.0

[thresholds]
hq_critical = 1.0
cr_critical = 1e-4
hq_monitoring = 0.2
cr_monitoring = 1e-6

[columns]
measurement_marker = "ng/g_lipid_LOD"
age_aliases = ["m_age", "age"]

[model]
artifact_path = "models/pcb_model.json"

[explanation]
reference_age = 30.0
high_risk_percent = 75.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn default_config_serializes_to_known_keys_only() {
    let toml_str = RiskConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
    let back: RiskConfig = toml::from_str(&toml_str).unwrap();
    assert_eq!(back, RiskConfig::default());
}

#[test]
fn suggestion_requires_small_edit_distance() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("exposure.weekly_intake", &known).as_deref(),
        Some("exposure.weekly_intake_g")
    );
    assert_eq!(suggest_correction("exposure.nonsense_value", &known), None);
}

// ============================================================================
// Consistency Validation
// ============================================================================

#[test]
fn monitoring_above_critical_is_rejected() {
    let mut config = RiskConfig::default();
    config.thresholds.hq_monitoring = 2.0;
    match config.validate() {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("thresholds.hq")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn non_positive_reference_dose_is_rejected() {
    let mut config = RiskConfig::default();
    config.exposure.reference_dose = 0.0;
    config.exposure.lifetime_years = f64::NAN;
    let Err(ConfigError::Validation(errors)) = config.validate() else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 2);
}

#[test]
fn inverted_explanation_cutoffs_are_rejected() {
    let mut config = RiskConfig::default();
    config.explanation.borderline_risk_percent = 90.0;
    assert!(config.validate().is_err());
}

#[test]
fn implausible_height_warns_but_validates() {
    let mut config = RiskConfig::default();
    config.exposure.assumed_height_m = 3.0;
    assert!(config.validate().is_ok());
    let warnings = plausibility_warnings(&config);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "exposure.assumed_height_m");
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[exposure]\nweekly_intake_g = 300.0\nunknown_knob = 1").unwrap();
    let config = RiskConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.exposure.weekly_intake_g, 300.0);
    assert_eq!(config.thresholds, RiskConfig::default().thresholds);
    assert!(config.model.artifact_path.is_none());
}

#[test]
fn invalid_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[thresholds]\ncr_monitoring = 0.5").unwrap();
    let err = RiskConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("thresholds.cr"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[exposure\nweekly_intake_g = ").unwrap();
    let err = RiskConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
}
