//! Risk Configuration - exposure constants and tier boundaries as TOML values
//!
//! Each struct implements `Default` with the published model constants, so a
//! missing config file reproduces the reference behaviour exactly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::thresholds::{exposure_constants, explanation_constants, risk_thresholds};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a risk analysis deployment.
///
/// Load with `RiskConfig::load()` which searches:
/// 1. `$PCB_RISK_CONFIG` env var
/// 2. `./pcb_risk.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Dose model parameters
    #[serde(default)]
    pub exposure: ExposureConfig,

    /// HQ / CR tier boundaries
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Column-name vocabularies
    #[serde(default)]
    pub columns: ColumnConfig,

    /// Classifier artifact location
    #[serde(default)]
    pub model: ModelConfig,

    /// Explanation generator reference patient and heuristic
    #[serde(default)]
    pub explanation: ExplanationConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            exposure: ExposureConfig::default(),
            thresholds: ThresholdConfig::default(),
            columns: ColumnConfig::default(),
            model: ModelConfig::default(),
            explanation: ExplanationConfig::default(),
        }
    }
}

impl RiskConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PCB_RISK_CONFIG` environment variable
    /// 2. `./pcb_risk.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded risk config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded risk config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No risk config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are logged as warnings; inconsistent values are an error.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!(field = %w.field, "{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        for w in super::validation::plausibility_warnings(&config) {
            warn!(field = %w.field, "{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Every numeric value must be finite
    /// - Divisors (height, weights, lifetime, RfD) must be positive
    /// - Monitoring bounds must not exceed critical bounds
    /// - Borderline cut-off must be below the high-risk cut-off
    /// - Column vocabularies must not be empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let e = &self.exposure;
        Self::check_positive(e.assumed_height_m, "exposure.assumed_height_m", &mut errors);
        Self::check_positive(e.fallback_weight_kg, "exposure.fallback_weight_kg", &mut errors);
        Self::check_positive(e.min_weight_kg, "exposure.min_weight_kg", &mut errors);
        Self::check_positive(e.lifetime_years, "exposure.lifetime_years", &mut errors);
        Self::check_positive(e.reference_dose, "exposure.reference_dose", &mut errors);
        Self::check_non_negative(e.weekly_intake_g, "exposure.weekly_intake_g", &mut errors);
        Self::check_non_negative(e.cancer_slope_factor, "exposure.cancer_slope_factor", &mut errors);

        let t = &self.thresholds;
        Self::check_non_negative(t.hq_monitoring, "thresholds.hq_monitoring", &mut errors);
        Self::check_non_negative(t.cr_monitoring, "thresholds.cr_monitoring", &mut errors);
        Self::check_escalation(t.hq_monitoring, t.hq_critical, "thresholds.hq", &mut errors);
        Self::check_escalation(t.cr_monitoring, t.cr_critical, "thresholds.cr", &mut errors);

        let c = &self.columns;
        if c.sample_id_patterns.is_empty() {
            errors.push("columns.sample_id_patterns must not be empty".to_string());
        }
        if c.measurement_marker.trim().is_empty() {
            errors.push("columns.measurement_marker must not be empty".to_string());
        }
        if c.age_aliases.is_empty() {
            errors.push("columns.age_aliases must not be empty".to_string());
        }
        if c.bmi_aliases.is_empty() {
            errors.push("columns.bmi_aliases must not be empty".to_string());
        }
        if c.explain_bmi_aliases.is_empty() {
            errors.push("columns.explain_bmi_aliases must not be empty".to_string());
        }

        let x = &self.explanation;
        for (value, name) in [
            (x.reference_age, "explanation.reference_age"),
            (x.reference_bmi, "explanation.reference_bmi"),
            (x.age_weight, "explanation.age_weight"),
            (x.bmi_weight, "explanation.bmi_weight"),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name}: value must be finite (got {value})"));
            }
        }
        let (high, borderline) = (x.high_risk_percent, x.borderline_risk_percent);
        if !high.is_finite() || !borderline.is_finite() {
            errors.push(format!(
                "explanation.risk_percent: values must be finite (got borderline={borderline}, high={high})"
            ));
        } else if borderline >= high {
            errors.push(format!(
                "explanation: borderline_risk_percent ({borderline:.1}) must be below high_risk_percent ({high:.1})"
            ));
        } else if !(0.0..=100.0).contains(&high) || borderline < 0.0 {
            errors.push(format!(
                "explanation: risk percent cut-offs must lie within 0-100 (got borderline={borderline:.1}, high={high:.1})"
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(lower: f64, upper: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, catch them explicitly
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got lower={lower}, upper={upper})"
            ));
            return;
        }
        if upper < lower {
            errors.push(format!(
                "{name}: upper bound ({upper:.3e}) must be >= lower bound ({lower:.3e})"
            ));
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} = {value} must be finite and > 0"));
        }
    }

    fn check_non_negative(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{name} = {value} must be finite and >= 0"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Exposure
// ============================================================================

/// Parameters of the dietary-intake dose model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Food intake per week (g/week)
    #[serde(default = "default_weekly_intake")]
    pub weekly_intake_g: f64,

    /// Height used to turn BMI into body weight (m)
    #[serde(default = "default_assumed_height")]
    pub assumed_height_m: f64,

    /// Body weight used when the BMI-derived weight is not positive (kg)
    #[serde(default = "default_fallback_weight")]
    pub fallback_weight_kg: f64,

    /// Floor applied to the dose divisor (kg)
    #[serde(default = "default_min_weight")]
    pub min_weight_kg: f64,

    /// Averaging lifetime for LADD (years)
    #[serde(default = "default_lifetime_years")]
    pub lifetime_years: f64,

    /// Reference dose RfD (mg/kg-day)
    #[serde(default = "default_reference_dose")]
    pub reference_dose: f64,

    /// Cancer slope factor CSF (per mg/kg-day)
    #[serde(default = "default_cancer_slope_factor")]
    pub cancer_slope_factor: f64,
}

fn default_weekly_intake() -> f64 { exposure_constants::DEFAULT_WEEKLY_INTAKE_G }
fn default_assumed_height() -> f64 { exposure_constants::ASSUMED_HEIGHT_M }
fn default_fallback_weight() -> f64 { exposure_constants::FALLBACK_WEIGHT_KG }
fn default_min_weight() -> f64 { exposure_constants::MIN_WEIGHT_KG }
fn default_lifetime_years() -> f64 { exposure_constants::LIFETIME_YEARS }
fn default_reference_dose() -> f64 { exposure_constants::REFERENCE_DOSE }
fn default_cancer_slope_factor() -> f64 { exposure_constants::CANCER_SLOPE_FACTOR }

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            weekly_intake_g: default_weekly_intake(),
            assumed_height_m: default_assumed_height(),
            fallback_weight_kg: default_fallback_weight(),
            min_weight_kg: default_min_weight(),
            lifetime_years: default_lifetime_years(),
            reference_dose: default_reference_dose(),
            cancer_slope_factor: default_cancer_slope_factor(),
        }
    }
}

// ============================================================================
// Tier Thresholds
// ============================================================================

/// Rule-based classification boundaries.
///
/// Critical is strict (`>`); monitoring bands are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_hq_critical")]
    pub hq_critical: f64,

    #[serde(default = "default_cr_critical")]
    pub cr_critical: f64,

    #[serde(default = "default_hq_monitoring")]
    pub hq_monitoring: f64,

    #[serde(default = "default_cr_monitoring")]
    pub cr_monitoring: f64,
}

fn default_hq_critical() -> f64 { risk_thresholds::HQ_CRITICAL }
fn default_cr_critical() -> f64 { risk_thresholds::CR_CRITICAL }
fn default_hq_monitoring() -> f64 { risk_thresholds::HQ_MONITORING }
fn default_cr_monitoring() -> f64 { risk_thresholds::CR_MONITORING }

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            hq_critical: default_hq_critical(),
            cr_critical: default_cr_critical(),
            hq_monitoring: default_hq_monitoring(),
            cr_monitoring: default_cr_monitoring(),
        }
    }
}

// ============================================================================
// Column Vocabularies
// ============================================================================

/// Name patterns used to locate columns in an input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Substrings (lowercase) marking the sample identifier column
    #[serde(default = "default_sample_id_patterns")]
    pub sample_id_patterns: Vec<String>,

    /// Literal substring marking a congener measurement column
    #[serde(default = "default_measurement_marker")]
    pub measurement_marker: String,

    /// Age column names, first match wins
    #[serde(default = "default_age_aliases")]
    pub age_aliases: Vec<String>,

    /// BMI column names, first match wins
    #[serde(default = "default_bmi_aliases")]
    pub bmi_aliases: Vec<String>,

    /// BMI field names probed when explaining one record, first numeric wins
    #[serde(default = "default_explain_bmi_aliases")]
    pub explain_bmi_aliases: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn default_sample_id_patterns() -> Vec<String> {
    owned(defaults::SAMPLE_ID_PATTERNS)
}
fn default_measurement_marker() -> String {
    defaults::MEASUREMENT_MARKER.to_string()
}
fn default_age_aliases() -> Vec<String> {
    owned(defaults::AGE_ALIASES)
}
fn default_bmi_aliases() -> Vec<String> {
    owned(defaults::BMI_ALIASES)
}
fn default_explain_bmi_aliases() -> Vec<String> {
    owned(defaults::EXPLAIN_BMI_ALIASES)
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sample_id_patterns: default_sample_id_patterns(),
            measurement_marker: default_measurement_marker(),
            age_aliases: default_age_aliases(),
            bmi_aliases: default_bmi_aliases(),
            explain_bmi_aliases: default_explain_bmi_aliases(),
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// Classifier artifact settings. Without a path the ML stage is skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON model artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
}

// ============================================================================
// Explanation
// ============================================================================

/// Reference patient and heuristic weights for per-patient explanations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationConfig {
    #[serde(default = "default_reference_age")]
    pub reference_age: f64,

    #[serde(default = "default_reference_bmi")]
    pub reference_bmi: f64,

    /// Heuristic logit weight per year of age
    #[serde(default = "default_age_weight")]
    pub age_weight: f64,

    /// Heuristic logit weight per BMI unit
    #[serde(default = "default_bmi_weight")]
    pub bmi_weight: f64,

    /// Probability (%) from which a patient is labelled high risk
    #[serde(default = "default_high_risk_percent")]
    pub high_risk_percent: f64,

    /// Probability (%) from which a patient is labelled borderline
    #[serde(default = "default_borderline_risk_percent")]
    pub borderline_risk_percent: f64,
}

fn default_reference_age() -> f64 { explanation_constants::REFERENCE_AGE }
fn default_reference_bmi() -> f64 { explanation_constants::REFERENCE_BMI }
fn default_age_weight() -> f64 { explanation_constants::AGE_WEIGHT }
fn default_bmi_weight() -> f64 { explanation_constants::BMI_WEIGHT }
fn default_high_risk_percent() -> f64 { explanation_constants::HIGH_RISK_PERCENT }
fn default_borderline_risk_percent() -> f64 { explanation_constants::BORDERLINE_RISK_PERCENT }

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            reference_age: default_reference_age(),
            reference_bmi: default_reference_bmi(),
            age_weight: default_age_weight(),
            bmi_weight: default_bmi_weight(),
            high_risk_percent: default_high_risk_percent(),
            borderline_risk_percent: default_borderline_risk_percent(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
