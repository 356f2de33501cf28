//! Run configuration.
//!
//! Every path and hyperparameter of a training or prediction run lives in a
//! [`PipelineConfig`]. Fields left out of a TOML file keep their defaults:
//!
//! ```toml
//! cv_folds = 5
//! cv_min_mcc = 0.3
//!
//! [paths]
//! train = "data/train.csv"
//!
//! [ensemble.rf]
//! n_estimators = 50
//! ```
use crate::error::ConfigError;
use protclass_ml::{BorutaParams, EnsembleParams, SmoteParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub train: PathBuf,
    pub independent_test: PathBuf,
    pub report: PathBuf,
    /// Written next to the report; holds the metrics as JSON.
    pub metrics: PathBuf,
    pub shap_dir: PathBuf,
    pub model: PathBuf,
    pub selector: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            train: PathBuf::from("train.xlsx"),
            independent_test: PathBuf::from("independent_test.xlsx"),
            report: PathBuf::from("training_report.txt"),
            metrics: PathBuf::from("results/metrics.json"),
            shap_dir: PathBuf::from("results/shap"),
            model: PathBuf::from("models/trained_model.pkl"),
            selector: PathBuf::from("models/feature_selector.pkl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,

    #[validate(range(min = 2, max = 100))]
    pub cv_folds: usize,

    /// Abort training when the mean cross-validation MCC falls below this.
    #[validate(range(min = -1.0, max = 1.0))]
    pub cv_min_mcc: Option<f64>,

    #[validate(range(min = 1))]
    pub shap_max_display: usize,

    pub smote: SmoteParams,
    pub boruta: BorutaParams,
    pub ensemble: EnsembleParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            paths: PathsConfig::default(),
            cv_folds: 5,
            cv_min_mcc: None,
            shap_max_display: protclass_plot::DEFAULT_MAX_DISPLAY,
            smote: SmoteParams::default(),
            boruta: BorutaParams::default(),
            ensemble: EnsembleParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// The config at `path`, or the defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => PipelineConfig::from_file(path),
            None => Ok(PipelineConfig::default()),
        }
    }
}

impl std::str::FromStr for PipelineConfig {
    type Err = ConfigError;

    /// Keys missing from `content` keep their defaults at every nesting
    /// level, so `[ensemble.lgbm]` with one key still describes the
    /// leaf-wise member.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let overlay: toml::Table = content.parse()?;
        let mut merged = toml::Value::try_from(PipelineConfig::default())?;
        merge(&mut merged, toml::Value::Table(overlay));
        let config: PipelineConfig = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.smote.k_neighbors, 5);
        assert_eq!(config.boruta.max_iter, 100);
        assert_eq!(config.ensemble.rf.n_estimators, 198);
        assert_eq!(config.paths.model, PathBuf::from("models/trained_model.pkl"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PipelineConfig = r#"
            cv_min_mcc = 0.25

            [paths]
            train = "data/train.csv"

            [ensemble.xgb]
            n_estimators = 10
        "#
        .parse()
        .unwrap();
        assert_eq!(config.paths.train, PathBuf::from("data/train.csv"));
        assert_eq!(config.paths.report, PathBuf::from("training_report.txt"));
        assert_eq!(config.ensemble.xgb.n_estimators, 10);
        assert_eq!(config.ensemble.xgb.learning_rate, 0.083);
        assert_eq!(config.cv_min_mcc, Some(0.25));
    }

    #[test]
    fn test_nested_sections_keep_member_defaults() {
        let config: PipelineConfig = r#"
            [ensemble.lgbm]
            n_estimators = 10

            [ensemble.rf]
            seed = 7
        "#
        .parse()
        .unwrap();
        let defaults = EnsembleParams::default();
        assert_eq!(config.ensemble.lgbm.n_estimators, 10);
        assert_eq!(config.ensemble.lgbm.growth, defaults.lgbm.growth);
        assert_eq!(config.ensemble.lgbm.learning_rate, defaults.lgbm.learning_rate);
        assert_eq!(config.ensemble.rf.seed, 7);
        assert_eq!(config.ensemble.rf.max_depth, Some(14));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            "cv_folds = 1".parse::<PipelineConfig>(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            "cv_min_mcc = 1.5".parse::<PipelineConfig>(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            "cv_folds = \"five\"".parse::<PipelineConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }
}
