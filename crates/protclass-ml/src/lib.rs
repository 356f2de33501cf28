//! protclass-ml
//!
//! In-memory learning stages of the residue classification pipeline:
//!
//! - [`FeaturePipeline`]: table → scaled feature matrix, fit once and reused
//! - [`svm_smote`]: minority oversampling near the SVM decision boundary
//! - [`select_features`]: Boruta all-relevant feature selection
//! - [`VotingEnsemble`]: two gradient-boosted tree models and a random forest
//! - [`cross_val_mcc`] and [`EvaluationMetrics`]: scoring
//! - [`TreeExplainer`]: exact TreeSHAP on a boosted model
//!
//! Nothing in this crate touches the filesystem. Every stage takes and returns
//! values; persistence and reporting live in the `protclass` crate.
//!
//! ```no_run
//! use protclass_ml::{Classifier, EnsembleParams, FeaturePipeline, LabelMode, VotingEnsemble};
//! # fn run(table: &protclass_io::Table) -> protclass_ml::Result<()> {
//! let (pipeline, data) = FeaturePipeline::fit_transform(table, LabelMode::Present)?;
//! let labels = data.labels.unwrap_or_default();
//! let mut model = VotingEnsemble::new(&EnsembleParams::default());
//! model.fit(&data.matrix.values, &labels)?;
//! # Ok(()) }
//! ```
mod binning;
mod boruta;
mod cart;
mod cv;
mod ensemble;
mod error;
mod forest;
pub mod gbdt;
mod matrix;
mod metrics;
mod model;
mod neighbors;
mod preprocess;
mod shap;
mod smote;
pub mod stats;
mod svm;
pub mod tree;

#[cfg(test)]
mod testing;

pub use self::binning::DEFAULT_MAX_BINS;
pub use self::boruta::{boruta, select_features, BorutaOutcome, BorutaParams, Decision, Selection};
pub use self::cv::{cross_val_mcc, stratified_kfold, Fold};
pub use self::ensemble::{EnsembleParams, VotingEnsemble};
pub use self::error::{MetricError, PipelineError, Result};
pub use self::forest::{RandomForest, RandomForestParams};
pub use self::gbdt::{BoosterParams, ClassWeighting, GradientBooster, GrowthPolicy};
pub use self::matrix::{FeatureMask, FeatureMatrix};
pub use self::metrics::{
    average_precision, classification_report, matthews_corrcoef, roc_auc, ConfusionMatrix,
    EvaluationMetrics,
};
pub use self::model::Classifier;
pub use self::neighbors::NearestNeighbors;
pub use self::preprocess::{
    structure_bucket, FeaturePipeline, LabelMode, Preprocessed, LABEL_COLUMN,
    NON_FEATURE_COLUMNS, OTHER_CATEGORY, PIPELINE_FORMAT_VERSION, STRUCTURE_COLUMN,
};
pub use self::shap::{ShapValues, TreeExplainer};
pub use self::smote::{svm_smote, Resampled, SmoteParams};
pub use self::svm::{fit_svc, scale_gamma, SvmParams, SvmSolution};
