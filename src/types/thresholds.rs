//! Toxicokinetic constants, classification thresholds and explanation constants
//!
//! These are the built-in defaults; every value can be overridden through
//! `RiskConfig` without touching code.

/// Exposure model parameters (after Abass et al., 2013)
pub mod exposure_constants {
    /// Height assumed when deriving body weight from BMI (m)
    pub const ASSUMED_HEIGHT_M: f64 = 1.6;
    /// Body weight substituted when the BMI-derived weight is not positive (kg)
    pub const FALLBACK_WEIGHT_KG: f64 = 60.0;
    /// Lower bound on the dose divisor (kg)
    pub const MIN_WEIGHT_KG: f64 = 1e-6;
    /// Default weekly food intake (g/week)
    pub const DEFAULT_WEEKLY_INTAKE_G: f64 = 150.0;
    pub const DAYS_PER_WEEK: f64 = 7.0;
    /// ng → mg
    pub const NG_TO_MG: f64 = 1e-6;
    /// Reference dose, RfD (mg/kg-day)
    pub const REFERENCE_DOSE: f64 = 2e-5;
    /// Cancer slope factor, CSF (per mg/kg-day)
    pub const CANCER_SLOPE_FACTOR: f64 = 2.0;
    /// Averaging lifetime (years)
    pub const LIFETIME_YEARS: f64 = 70.0;
}

/// Rule-based tier boundaries
pub mod risk_thresholds {
    /// HQ above this is critical
    pub const HQ_CRITICAL: f64 = 1.0;
    /// CR above this is critical
    pub const CR_CRITICAL: f64 = 1e-4;
    /// HQ at or above this (and not critical) needs monitoring
    pub const HQ_MONITORING: f64 = 0.1;
    /// CR at or above this (and not critical) needs monitoring
    pub const CR_MONITORING: f64 = 1e-6;
}

/// ML blending
pub mod ml_constants {
    /// Decision threshold used when an artifact does not carry one
    pub const DEFAULT_THRESHOLD: f64 = 0.5;
}

/// Explanation generator reference patient and heuristic weights
pub mod explanation_constants {
    pub const REFERENCE_AGE: f64 = 30.0;
    pub const REFERENCE_BMI: f64 = 25.0;
    /// Logistic heuristic weight per year above the reference age
    pub const AGE_WEIGHT: f64 = 0.05;
    /// Logistic heuristic weight per BMI unit above the reference BMI
    pub const BMI_WEIGHT: f64 = 0.08;
    /// Probability (%) at or above which the label is "High risk"
    pub const HIGH_RISK_PERCENT: f64 = 80.0;
    /// Probability (%) at or above which the label is "Borderline risk"
    pub const BORDERLINE_RISK_PERCENT: f64 = 50.0;
}
