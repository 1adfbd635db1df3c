//! Risk tiers and ML labels

use serde::{Deserialize, Serialize};

/// Risk tier of a sample.
///
/// The rule-based `Status` only ever takes `Safe`, `NeedsMonitoring`,
/// `CriticalRisk`, `Unknown` or `Error`. The two `(ML)` variants appear only in
/// `Final_Status`, when a high ML probability escalated a lower tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskStatus {
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "Needs Monitoring")]
    NeedsMonitoring,
    #[serde(rename = "Critical Risk")]
    CriticalRisk,
    #[serde(rename = "Needs Monitoring (ML)")]
    NeedsMonitoringMl,
    #[serde(rename = "Critical Risk (ML)")]
    CriticalRiskMl,
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "Error")]
    Error,
}

impl RiskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::NeedsMonitoring => "Needs Monitoring",
            Self::CriticalRisk => "Critical Risk",
            Self::NeedsMonitoringMl => "Needs Monitoring (ML)",
            Self::CriticalRiskMl => "Critical Risk (ML)",
            Self::Unknown => "Unknown",
            Self::Error => "Error",
        }
    }

    /// True for the tiers produced by ML escalation.
    pub const fn is_ml_escalated(self) -> bool {
        matches!(self, Self::NeedsMonitoringMl | Self::CriticalRiskMl)
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label derived from the ML probability and the artifact threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MlLabel {
    #[serde(rename = "High ML risk")]
    High,
    #[serde(rename = "Low ML risk")]
    Low,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl MlLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High ML risk",
            Self::Low => "Low ML risk",
            Self::Unknown => "Unknown",
        }
    }

    /// `High` when `probability >= threshold`.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for MlLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_display_names() {
        let json = serde_json::to_string(&RiskStatus::NeedsMonitoringMl).unwrap();
        assert_eq!(json, "\"Needs Monitoring (ML)\"");
        let back: RiskStatus = serde_json::from_str("\"Critical Risk\"").unwrap();
        assert_eq!(back, RiskStatus::CriticalRisk);
    }

    #[test]
    fn test_status_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(RiskStatus::Safe, 3usize);
        map.insert(RiskStatus::Error, 1usize);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Safe":3,"Error":1}"#);
    }

    #[test]
    fn test_ml_label_threshold_is_inclusive() {
        assert_eq!(MlLabel::from_probability(0.5, 0.5), MlLabel::High);
        assert_eq!(MlLabel::from_probability(0.4999, 0.5), MlLabel::Low);
        assert_eq!(MlLabel::High.to_string(), "High ML risk");
    }
}
