//! Explanation text
//!
//! Fixed sentence templates for the per-patient summary and the offline
//! clinical note. Nothing here calls out to a language model.

use crate::types::{ExplanationInputs, ExplanationRecord, FeatureContributions};

pub const MISSING_INPUTS_SUMMARY: &str = "Age or pre-pregnancy BMI is missing in this row, \
     so the model could not estimate PCB risk. Please ensure the CSV includes columns for \
     maternal age and pre-pregnancy BMI.";

pub const UNDEFINED_PROBABILITY_SUMMARY: &str = "The model produced an undefined probability \
     for this patient. Please check that the inputs are valid numeric values.";

const DISCLAIMER: &str = "This explanation is auto-generated from a PCB risk model and is \
     for research/screening only, not a definitive clinical diagnosis.";

/// `increases` for a positive contribution, `decreases` otherwise.
fn direction(contribution: Option<f64>) -> &'static str {
    match contribution {
        Some(c) if c > 0.0 => "increases",
        _ => "decreases",
    }
}

/// One-paragraph summary for a patient whose inputs are both present.
pub fn compose_summary(
    probability: Option<f64>,
    inputs: &ExplanationInputs,
    contributions: &FeatureContributions,
    reference_age: f64,
    reference_bmi: f64,
) -> String {
    let (Some(p), Some(age), Some(bmi)) = (probability, inputs.age, inputs.bmi) else {
        return UNDEFINED_PROBABILITY_SUMMARY.to_string();
    };
    let pct = p * 100.0;
    format!(
        "Based on maternal age and pre-pregnancy BMI, this patient has an estimated {pct:.0}% \
         probability of belonging to the high PCB risk group. A maternal age of {age:.1} years \
         {} risk compared with a reference of {} years, while a pre-pregnancy BMI of {bmi:.1} \
         {} risk compared with BMI {}.",
        direction(contributions.age),
        format_significant(reference_age, 6),
        direction(contributions.bmi),
        format_significant(reference_bmi, 6),
    )
}

/// Short plain-text note built from the numbers of an explanation only.
pub fn clinical_note(record: &ExplanationRecord) -> String {
    let mut parts = vec![format!(
        "Overall model classification: {} PCB-related risk.",
        record.risk_label
    )];

    if let Some(hq) = record.hq {
        parts.push(format!("Non-cancer hazard index (HQ) ≈ {}.", format_significant(hq, 3)));
    }
    if let Some(cr) = record.cr {
        parts.push(format!(
            "Lifetime cancer risk estimate (CR) ≈ {}.",
            format_significant(cr, 3)
        ));
    }

    let mut drivers: Vec<(&str, f64)> = [
        ("maternal age", record.shap_values.age),
        ("pre-pregnancy BMI", record.shap_values.bmi),
    ]
    .into_iter()
    .filter_map(|(name, impact)| impact.map(|i| (name, i)))
    .collect();
    drivers.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    if !drivers.is_empty() {
        let top = drivers
            .iter()
            .map(|(name, impact)| format!("{name} (impact {})", format_significant(*impact, 3)))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Key drivers in this pregnancy: {top}."));
    }

    parts.push(DISCLAIMER.to_string());
    parts.join(" ")
}

/// Render `value` with `digits` significant digits, switching to exponent
/// notation for very small or large magnitudes and dropping trailing zeros.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}"))
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
