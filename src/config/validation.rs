//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on exposure parameters.
//!
//! The raw TOML is first walked as a `toml::Value` tree and every dotted key
//! is compared against the known field names. Unknown keys become warnings
//! with a "did you mean?" suggestion; they never fail the load.

use std::collections::HashSet;

/// A non-fatal config warning (typo, implausible value).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `RiskConfig`.
///
/// Kept in step with the structs in `risk_config.rs` by hand.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [exposure]
        "exposure",
        "exposure.weekly_intake_g",
        "exposure.assumed_height_m",
        "exposure.fallback_weight_kg",
        "exposure.min_weight_kg",
        "exposure.lifetime_years",
        "exposure.reference_dose",
        "exposure.cancer_slope_factor",
        // [thresholds]
        "thresholds",
        "thresholds.hq_critical",
        "thresholds.cr_critical",
        "thresholds.hq_monitoring",
        "thresholds.cr_monitoring",
        // [columns]
        "columns",
        "columns.sample_id_patterns",
        "columns.measurement_marker",
        "columns.age_aliases",
        "columns.bmi_aliases",
        "columns.explain_bmi_aliases",
        // [model]
        "model",
        "model.artifact_path",
        // [explanation]
        "explanation",
        "explanation.reference_age",
        "explanation.reference_bmi",
        "explanation.age_weight",
        "explanation.bmi_weight",
        "explanation.high_risk_percent",
        "explanation.borderline_risk_percent",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Collect the dotted path of every key in a TOML tree, tables included.
///
/// `{ a = { b = 1 } }` yields `["a", "a.b"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };
    let mut keys = Vec::with_capacity(table.len());
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            let nested = walk_toml_keys(v, &path);
            keys.push(path);
            keys.extend(nested);
        } else {
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

/// Levenshtein edit distance, counted in characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest known key within edit distance 3; ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(d, _)| *d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warnings for every key in `raw_toml` that `RiskConfig` does not know.
///
/// Syntax errors yield no warnings here; they surface from the serde parse.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Values that validate but fall outside the range the dose model was built for.
pub fn plausibility_warnings(config: &super::RiskConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let e = &config.exposure;

    // Adult height: 1.2-2.2 m
    if !(1.2..=2.2).contains(&e.assumed_height_m) {
        warnings.push(ValidationWarning {
            field: "exposure.assumed_height_m".to_string(),
            message: format!(
                "assumed_height_m = {:.2} is outside the typical adult range (1.2-2.2 m)",
                e.assumed_height_m
            ),
            suggestion: None,
        });
    }

    // Fish/food intake above 5 kg per week is not a dietary estimate
    if e.weekly_intake_g > 5_000.0 {
        warnings.push(ValidationWarning {
            field: "exposure.weekly_intake_g".to_string(),
            message: format!(
                "weekly_intake_g = {:.0} exceeds 5000 g/week",
                e.weekly_intake_g
            ),
            suggestion: None,
        });
    }

    if !(30.0..=120.0).contains(&e.lifetime_years) {
        warnings.push(ValidationWarning {
            field: "exposure.lifetime_years".to_string(),
            message: format!(
                "lifetime_years = {:.0} is outside 30-120 years",
                e.lifetime_years
            ),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("bmi", "bmi"), 0);
        assert_eq!(levenshtein("refrence_dose", "reference_dose"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("bmi²", "bmi2"), 1);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [exposure]
            weekly_intake_g = 150.0
            [columns]
            age_aliases = ["m_age"]
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"exposure".to_string()));
        assert!(keys.contains(&"exposure.weekly_intake_g".to_string()));
        assert!(keys.contains(&"columns.age_aliases".to_string()));
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[exposure]\nrefrence_dose = 2e-5\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "exposure.refrence_dose");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("exposure.reference_dose")
        );
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[exposure]
weekly_intake_g = 200.0

[thresholds]
hq_critical = 1.0

[model]
artifact_path = "models/pcb_rf.json"

[explanation]
reference_age = 30.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_without_close_match() {
        let warnings = validate_unknown_keys("[server]\naddr = \"0.0.0.0:8080\"\n");
        assert!(warnings.iter().any(|w| w.field == "server.addr"));
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_syntax_error_yields_no_warnings() {
        assert!(validate_unknown_keys("[exposure\nweekly").is_empty());
    }

    #[test]
    fn test_plausibility_defaults_clean() {
        assert!(plausibility_warnings(&RiskConfig::default()).is_empty());
    }

    #[test]
    fn test_plausibility_flags_tall_height() {
        let mut config = RiskConfig::default();
        config.exposure.assumed_height_m = 3.0;
        let warnings = plausibility_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "exposure.assumed_height_m");
    }
}
