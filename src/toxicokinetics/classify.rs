//! Rule-based risk tiers from HQ and CR

use crate::config::ThresholdConfig;
use crate::types::RiskStatus;

/// Map hazard quotient and cancer risk to a tier.
///
/// - `Critical Risk`: HQ or CR strictly above its critical bound
/// - `Needs Monitoring`: HQ or CR inside its inclusive monitoring band
/// - `Safe`: otherwise
///
/// A NaN in either quantity gives `Unknown`.
pub fn classify(hq: f64, cr: f64, thresholds: &ThresholdConfig) -> RiskStatus {
    if hq.is_nan() || cr.is_nan() {
        return RiskStatus::Unknown;
    }

    if hq > thresholds.hq_critical || cr > thresholds.cr_critical {
        return RiskStatus::CriticalRisk;
    }

    let hq_band = (thresholds.hq_monitoring..=thresholds.hq_critical).contains(&hq);
    let cr_band = (thresholds.cr_monitoring..=thresholds.cr_critical).contains(&cr);
    if hq_band || cr_band {
        RiskStatus::NeedsMonitoring
    } else {
        RiskStatus::Safe
    }
}
