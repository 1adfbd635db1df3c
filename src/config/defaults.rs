//! System-wide default constants.
//!
//! Column-matching vocabularies and file locations. Numeric model constants
//! live in `types::thresholds`.

// ============================================================================
// Configuration Files
// ============================================================================

/// Environment variable holding the path to a TOML config file.
pub const CONFIG_ENV_VAR: &str = "PCB_RISK_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "pcb_risk.toml";

// ============================================================================
// Column Detection
// ============================================================================

/// Substrings identifying the sample identifier column, tested against the
/// lowercased column name.
pub const SAMPLE_ID_PATTERNS: &[&str] = &[
    "sample", "id", "patient", "subject", "case", "no", "number", "code",
];

/// Literal substring marking a congener concentration column.
pub const MEASUREMENT_MARKER: &str = "ng/g_lipid_LOD";

/// Accepted names for maternal age, in priority order.
pub const AGE_ALIASES: &[&str] = &[
    "m_age",
    "maternal_age",
    "Maternal age",
    "Maternal_age",
    "mother_age",
    "age",
];

/// Accepted names for pre-pregnancy BMI when resolving dataset columns, in
/// priority order.
///
/// `prepregancy_bmi` (sic) is the spelling used by the cohort exports.
pub const BMI_ALIASES: &[&str] = &[
    "prepregancy_bmi",
    "prepregnancy_bmi",
    "pre-pregnancy_bmi",
    "pre_preg_bmi",
    "BMI",
    "bmi",
];

/// Accepted names for pre-pregnancy BMI when explaining a single record.
///
/// Correctly spelled names win over the cohort-export spelling here, so a
/// record carrying both reads the corrected value.
pub const EXPLAIN_BMI_ALIASES: &[&str] = &[
    "prepregnancy_bmi",
    "pre-pregnancy_bmi",
    "prepregancy_bmi",
    "pre_preg_bmi",
    "BMI",
    "bmi",
];

/// Column that carries a patient identifier when `sample_id` is absent.
pub const PATIENT_ID_COLUMN: &str = "patient_id";

// ============================================================================
// Reporting
// ============================================================================

/// Number of critical rows previewed in the clinician digest.
pub const CRITICAL_PREVIEW_LIMIT: usize = 5;
