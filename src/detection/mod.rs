//! Column Detection
//!
//! Works out which column of an input table is the sample identifier, which
//! columns carry congener concentrations, and which carry age and BMI.
//! Detection is name-based only and runs once per dataset.

mod aliases;

pub use aliases::{resolve_column, resolve_first};

use tracing::debug;

use crate::config::ColumnConfig;
use crate::types::ColumnLayout;

/// Pick the sample identifier column.
///
/// Columns are scanned in order and each is tested against every pattern
/// (substring of the lowercased name); the first column with any hit wins.
/// Falls back to the first column. Returns `None` only for an empty header.
pub fn detect_sample_column<'a, S: AsRef<str>>(columns: &'a [String], patterns: &[S]) -> Option<&'a str> {
    columns
        .iter()
        .find(|col| {
            let lower = col.to_lowercase();
            patterns.iter().any(|p| lower.contains(p.as_ref()))
        })
        .or_else(|| columns.first())
        .map(String::as_str)
}

/// Every column whose name contains `marker` literally, in header order.
pub fn detect_pcb_columns(columns: &[String], marker: &str) -> Vec<String> {
    columns.iter().filter(|c| c.contains(marker)).cloned().collect()
}

/// Applies a `ColumnConfig` vocabulary to a dataset header.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    config: ColumnConfig,
}

impl ColumnDetector {
    pub fn new(config: ColumnConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ColumnConfig {
        &self.config
    }

    /// Build the full column layout for a header.
    ///
    /// The measurement list may come back empty; callers decide whether
    /// that is fatal.
    pub fn detect(&self, columns: &[String]) -> ColumnLayout {
        let sample_column = detect_sample_column(columns, &self.config.sample_id_patterns)
            .unwrap_or_default()
            .to_string();
        let measurement_columns = detect_pcb_columns(columns, &self.config.measurement_marker);
        let age_column = resolve_column(&self.config.age_aliases, columns).map(str::to_string);
        let bmi_column = resolve_column(&self.config.bmi_aliases, columns).map(str::to_string);

        debug!(
            sample = %sample_column,
            measurements = measurement_columns.len(),
            age = ?age_column,
            bmi = ?bmi_column,
            "Detected column layout"
        );

        ColumnLayout {
            sample_column,
            measurement_columns,
            age_column,
            bmi_column,
        }
    }
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new(ColumnConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::SAMPLE_ID_PATTERNS;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sample_column_scans_columns_not_patterns() {
        // "Code" matches a late pattern but comes before "Sample"
        let columns = cols(&["Region", "Code", "Sample"]);
        assert_eq!(detect_sample_column(&columns, SAMPLE_ID_PATTERNS), Some("Code"));
    }

    #[test]
    fn test_sample_column_is_case_insensitive() {
        let columns = cols(&["m_age", "PATIENT_REF"]);
        assert_eq!(detect_sample_column(&columns, SAMPLE_ID_PATTERNS), Some("PATIENT_REF"));
    }

    #[test]
    fn test_sample_column_falls_back_to_first() {
        let columns = cols(&["alpha", "beta"]);
        assert_eq!(detect_sample_column(&columns, SAMPLE_ID_PATTERNS), Some("alpha"));
        assert_eq!(detect_sample_column(&[], SAMPLE_ID_PATTERNS), None);
    }

    #[test]
    fn test_pcb_columns_need_literal_marker() {
        let columns = cols(&[
            "PCB118 ng/g_lipid_LOD",
            "PCB153 ng/g_lipid_lod",
            "PCB180_ng/g_lipid_LOD_adj",
            "PCB138 ng/g",
        ]);
        assert_eq!(
            detect_pcb_columns(&columns, "ng/g_lipid_LOD"),
            cols(&["PCB118 ng/g_lipid_LOD", "PCB180_ng/g_lipid_LOD_adj"])
        );
    }

    #[test]
    fn test_pcb_columns_may_be_empty() {
        assert!(detect_pcb_columns(&cols(&["a", "b"]), "ng/g_lipid_LOD").is_empty());
    }

    #[test]
    fn test_detector_builds_layout() {
        let columns = cols(&[
            "Sample No",
            "maternal_age",
            "m_age",
            "BMI",
            "PCB118 ng/g_lipid_LOD",
        ]);
        let layout = ColumnDetector::default().detect(&columns);
        assert_eq!(layout.sample_column, "Sample No");
        assert_eq!(layout.measurement_columns, cols(&["PCB118 ng/g_lipid_LOD"]));
        assert_eq!(layout.age_column.as_deref(), Some("m_age"));
        assert_eq!(layout.bmi_column.as_deref(), Some("BMI"));
    }
}
