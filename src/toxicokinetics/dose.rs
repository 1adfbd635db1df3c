//! Dietary intake dose model (after Abass et al., 2013)
//!
//! Pure arithmetic, no I/O. The concentration sum is in ng/g lipid; doses
//! come out in mg per kg body weight per day.

use crate::config::{ExposureConfig, ThresholdConfig};
use crate::types::thresholds::exposure_constants::{DAYS_PER_WEEK, NG_TO_MG};
use crate::types::RiskMetrics;

/// Body weight estimated from BMI at the assumed height (kg).
///
/// A non-positive estimate is replaced by the fallback weight.
pub fn estimate_body_weight(bmi: f64, exposure: &ExposureConfig) -> f64 {
    let weight = bmi * exposure.assumed_height_m.powi(2);
    if weight <= 0.0 {
        exposure.fallback_weight_kg
    } else {
        weight
    }
}

/// Dose and risk metrics for one sample, with every exposure parameter
/// taken from `exposure` and the intake given explicitly.
///
/// Inputs are not validated here; the high-risk flag uses the critical
/// bounds of `thresholds`.
pub fn compute_risk_with(
    exposure: &ExposureConfig,
    thresholds: &ThresholdConfig,
    age: f64,
    bmi: f64,
    congener_sum: f64,
    weekly_intake: f64,
) -> RiskMetrics {
    let weight = estimate_body_weight(bmi, exposure);
    let daily_food_g = weekly_intake / DAYS_PER_WEEK;

    // (g/day × ng/g) / kg = ng/kg-day
    let dose_ng = (daily_food_g * congener_sum) / weight.max(exposure.min_weight_kg);
    let add = dose_ng * NG_TO_MG;

    let hazard_quotient = add / exposure.reference_dose;
    let ladd = (add * age) / exposure.lifetime_years;
    let cancer_risk = ladd * exposure.cancer_slope_factor;

    RiskMetrics {
        hazard_quotient,
        cancer_risk,
        total_risk: hazard_quotient + cancer_risk,
        high_risk: hazard_quotient > thresholds.hq_critical
            || cancer_risk > thresholds.cr_critical,
        average_daily_dose: add,
        lifetime_average_daily_dose: ladd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_from_bmi() {
        let e = ExposureConfig::default();
        assert!((estimate_body_weight(25.0, &e) - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_fallback_for_non_positive_bmi() {
        let e = ExposureConfig::default();
        assert_eq!(estimate_body_weight(0.0, &e), 60.0);
        assert_eq!(estimate_body_weight(-3.0, &e), 60.0);
    }

    #[test]
    fn test_custom_exposure_parameters_are_used() {
        let e = ExposureConfig {
            reference_dose: 4e-5,
            ..ExposureConfig::default()
        };
        let t = ThresholdConfig::default();
        let m = compute_risk_with(&e, &t, 30.0, 25.0, 100.0, 150.0);
        let default = compute_risk_with(&ExposureConfig::default(), &t, 30.0, 25.0, 100.0, 150.0);
        assert!((m.hazard_quotient * 2.0 - default.hazard_quotient).abs() < 1e-12);
        assert_eq!(m.average_daily_dose, default.average_daily_dose);
    }
}
