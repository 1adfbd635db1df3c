//! Risk Model Configuration
//!
//! Every exposure constant, tier boundary, column vocabulary and explanation
//! parameter is an operator-tunable TOML value.
//!
//! ## Loading Order
//!
//! 1. `PCB_RISK_CONFIG` environment variable (path to TOML file)
//! 2. `pcb_risk.toml` in the current working directory
//! 3. Built-in defaults (the published model constants)
//!
//! ## Usage
//!
//! ```ignore
//! let config = RiskConfig::load();
//! let analyzer = DatasetAnalyzer::new(&config, loader);
//! ```

mod risk_config;
pub mod defaults;
pub mod validation;

pub use risk_config::*;
