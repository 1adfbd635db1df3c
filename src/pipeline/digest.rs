//! Clinician digest
//!
//! A compact view of one analysis for a reviewing clinician: headline
//! numbers, the worst rule-based critical cases, and a research-only note
//! naming the thresholds the report was classified with.

use std::collections::BTreeMap;

use serde::Serialize;

use super::analyzer::AnalysisReport;
use crate::config::defaults::CRITICAL_PREVIEW_LIMIT;
use crate::config::ThresholdConfig;
use crate::types::{CellValue, RiskStatus};

/// Headline numbers of the digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestOverview {
    pub total_samples: usize,
    pub status_distribution: BTreeMap<RiskStatus, usize>,
    #[serde(rename = "mean_HQ")]
    pub mean_hq: Option<f64>,
    #[serde(rename = "mean_CR")]
    pub mean_cr: Option<f64>,
}

/// One row of the critical-case preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalCase {
    pub sample_id: CellValue,
    #[serde(rename = "HQ")]
    pub hq: Option<f64>,
    #[serde(rename = "CR")]
    pub cr: Option<f64>,
    #[serde(rename = "Total_PCB")]
    pub total_pcb: Option<f64>,
    #[serde(rename = "Status")]
    pub status: RiskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalDigest {
    pub overview: DigestOverview,
    pub critical_cases_preview: Vec<CriticalCase>,
    pub clinical_note: String,
}

impl ClinicalDigest {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut critical: Vec<CriticalCase> = report
            .rows
            .iter()
            .filter(|row| row.status == RiskStatus::CriticalRisk)
            .map(|row| CriticalCase {
                sample_id: row.sample_id.clone(),
                hq: row.hq,
                cr: row.cr,
                total_pcb: row.total_pcb,
                status: row.status,
            })
            .collect();
        // Highest HQ first; undefined HQ sorts last, ties keep input order
        critical.sort_by(|a, b| {
            let a = a.hq.unwrap_or(f64::NEG_INFINITY);
            let b = b.hq.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        critical.truncate(CRITICAL_PREVIEW_LIMIT);

        Self {
            overview: DigestOverview {
                total_samples: report.summary.total_samples,
                status_distribution: report.summary.status_distribution.clone(),
                mean_hq: report.stats.mean_hq,
                mean_cr: report.stats.mean_cr,
            },
            critical_cases_preview: critical,
            clinical_note: clinical_note_text(&report.thresholds),
        }
    }
}

fn clinical_note_text(thresholds: &ThresholdConfig) -> String {
    format!(
        "Patients labeled 'Critical Risk' exceed internal PCB exposure thresholds \
         (HQ>{} or CR>{:e}). This is research-only, not a diagnosis.",
        thresholds.hq_critical, thresholds.cr_critical
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::RiskConfig;
    use crate::ml_engine::ModelLoader;
    use crate::pipeline::{analyze, DatasetAnalyzer};
    use crate::types::Dataset;

    fn report_with_totals(totals: &[f64]) -> AnalysisReport {
        let rows = totals
            .iter()
            .enumerate()
            .map(|(i, t)| {
                vec![
                    CellValue::Text(format!("P{i}")),
                    30.0.into(),
                    25.0.into(),
                    (*t).into(),
                ]
            })
            .collect();
        let ds = Dataset::with_rows(["id", "m_age", "bmi", "PCB153 ng/g_lipid_LOD"], rows).unwrap();
        analyze(&ds).unwrap()
    }

    #[test]
    fn test_preview_sorted_and_limited() {
        // 64 kg body weight: HQ = total * 150/7 * 1e-6 / 64 / 2e-5
        let totals = [100.0, 9000.0, 7000.0, 8000.0, 6500.0, 10000.0, 12000.0, 1.0];
        let report = report_with_totals(&totals);
        let digest = ClinicalDigest::from_report(&report);

        assert_eq!(digest.overview.total_samples, 8);
        assert_eq!(digest.critical_cases_preview.len(), CRITICAL_PREVIEW_LIMIT);
        let ids: Vec<String> = digest
            .critical_cases_preview
            .iter()
            .filter_map(|c| c.sample_id.as_text())
            .collect();
        assert_eq!(ids, vec!["P6", "P5", "P1", "P3", "P2"]);
        assert!(digest
            .critical_cases_preview
            .windows(2)
            .all(|w| w[0].hq >= w[1].hq));
    }

    #[test]
    fn test_no_critical_rows_gives_empty_preview() {
        let report = report_with_totals(&[1.0, 2.0]);
        let digest = ClinicalDigest::from_report(&report);
        assert!(digest.critical_cases_preview.is_empty());
        assert_eq!(digest.overview.status_distribution.get(&RiskStatus::Safe), Some(&2));
    }

    #[test]
    fn test_note_names_thresholds() {
        let note = clinical_note_text(&ThresholdConfig::default());
        assert!(note.contains("HQ>1 "));
        assert!(note.contains("CR>1e-4"));
        assert!(note.contains("research-only"));
    }

    #[test]
    fn test_note_follows_configured_thresholds() {
        let mut config = RiskConfig::default();
        config.thresholds.hq_critical = 2.0;
        config.thresholds.cr_critical = 5e-4;
        let ds = Dataset::with_rows(
            ["id", "m_age", "bmi", "PCB153 ng/g_lipid_LOD"],
            vec![vec!["P0".into(), 30.0.into(), 25.0.into(), 100.0.into()]],
        )
        .unwrap();
        let report = DatasetAnalyzer::new(&config, Arc::new(ModelLoader::disabled()))
            .analyze(&ds)
            .unwrap();

        let digest = ClinicalDigest::from_report(&report);
        assert!(digest.clinical_note.contains("HQ>2 "));
        assert!(digest.clinical_note.contains("CR>5e-4"));
        // HQ 1.67 is below the configured critical bound
        assert!(digest.critical_cases_preview.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let digest = ClinicalDigest::from_report(&report_with_totals(&[12000.0]));
        let value = serde_json::to_value(&digest).unwrap();
        assert_eq!(value["overview"]["total_samples"], 1);
        assert_eq!(value["critical_cases_preview"][0]["Status"], "Critical Risk");
        assert!(value["critical_cases_preview"][0]["HQ"].as_f64().unwrap() > 1.0);
        assert!(value["clinical_note"].is_string());
    }
}
