//! ML Engine for PCB high-risk probability
//!
//! Optional second opinion on top of the rule-based tiers. The engine never
//! trains anything; it consumes an artifact produced offline.
//!
//! ## Architecture
//! - `artifact`: JSON artifact format, `Classifier` trait, logistic and
//!   random-forest evaluators, load-time validation
//! - `loader`: `ModelLoader`, the lazily initialised `loaded | unavailable`
//!   service injected into the analyzer and the explanation generator
//! - `blender`: imputation, scoring and the `Final_Status` combination rule

pub mod artifact;
pub mod blender;
pub mod loader;

pub use artifact::{
    ArtifactError, ArtifactFile, Classifier, DecisionTree, ForestModel, LogisticModel,
    ModelArtifact, ModelSpec, PredictionError, TreeNode,
};
pub use blender::{combine_status, BlendOutcome, MlBlender, SkipReason};
pub use loader::{ArtifactState, ModelLoader};
