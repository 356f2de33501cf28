//! # protclass
//!
//! Training and prediction runs of the residue classifier.
//!
//! A training run reads the training and independent test tables, fits the
//! feature pipeline, balances the classes with SVM-SMOTE, selects features
//! with Boruta, cross-validates and fits the voting ensemble, writes the
//! evaluation report and SHAP plots, and pickles the model and the pipeline.
//! A prediction run loads both artifacts and scores a new table.
//!
//! ```no_run
//! use protclass::{predict_single_file, run_training, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_file("protclass.toml").unwrap();
//! run_training(&config);
//! predict_single_file(
//!     &config.paths.model,
//!     &config.paths.selector,
//!     Path::new("1WQW_A_feature.csv"),
//!     None,
//! );
//! ```
mod config;
mod error;
pub mod persist;
mod predict;
mod train;

#[cfg(test)]
mod testing;

pub use config::{PathsConfig, PipelineConfig};
pub use error::{ArtifactError, ConfigError};
pub use predict::{
    default_output_path, predict_single_file, predicted_labels, PREDICTED_LABEL,
    PROBABILITY_CLASS_0, PROBABILITY_CLASS_1,
};
pub use train::{run_training, train_model, TrainingSummary, INDEPENDENT_SET_NAME};
