//! Gradient boosted decision trees with logistic loss.
//!
//! One engine, two growth strategies:
//!
//! - [`GrowthPolicy::DepthWise`] grows level by level up to `max_depth`, the
//!   way xgboost's `hist` method does.
//! - [`GrowthPolicy::LeafWise`] always expands the leaf with the best gain
//!   until `max_leaves` is reached, the way LightGBM does.
//!
//! Splits are searched on quantile histograms (see [`crate::binning`]) using
//! first and second derivatives of the log loss. The initial margin is the
//! log-odds of the positive rate.
mod grower;

use crate::binning::{BinnedMatrix, DEFAULT_MAX_BINS};
use crate::model::{check_training_input, check_width, derive_seed, sigmoid, Classifier};
use crate::tree::Tree;
use crate::{PipelineError, Result};
use grower::{grow_tree, GrowParams};
use ndarray::Array2;
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthPolicy {
    DepthWise,
    LeafWise { max_leaves: usize },
}

/// How positive rows are re-weighted in the gradients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClassWeighting {
    None,
    /// Up-weight the rarer class by the majority/minority count ratio.
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: Option<usize>,
    pub growth: GrowthPolicy,
    /// L2 penalty on leaf weights.
    pub lambda: f64,
    /// Minimum gain required to split.
    pub gamma: f64,
    pub min_child_weight: f64,
    pub min_child_samples: usize,
    pub colsample_bytree: f64,
    pub subsample: f64,
    /// Resample rows every `subsample_freq` rounds; 0 disables row sampling.
    pub subsample_freq: usize,
    pub class_weighting: ClassWeighting,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        BoosterParams::xgb_member()
    }
}

impl BoosterParams {
    /// The `xgb` member of the voting ensemble.
    pub fn xgb_member() -> Self {
        BoosterParams {
            n_estimators: 200,
            learning_rate: 0.083,
            max_depth: Some(10),
            growth: GrowthPolicy::DepthWise,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            min_child_samples: 0,
            colsample_bytree: 1.0,
            subsample: 1.0,
            subsample_freq: 1,
            class_weighting: ClassWeighting::None,
            max_bins: DEFAULT_MAX_BINS,
            seed: 42,
        }
    }

    /// The `lgbm` member of the voting ensemble. The bagging fraction is kept
    /// but stays inactive because the bagging frequency is zero.
    pub fn lgbm_member() -> Self {
        BoosterParams {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: Some(10),
            growth: GrowthPolicy::LeafWise { max_leaves: 31 },
            lambda: 0.0,
            gamma: 0.0,
            min_child_weight: 1e-3,
            min_child_samples: 20,
            colsample_bytree: 0.72,
            subsample: 0.82,
            subsample_freq: 0,
            class_weighting: ClassWeighting::Balanced,
            max_bins: DEFAULT_MAX_BINS,
            seed: 42,
        }
    }

    fn validate(&self) -> Result<()> {
        let bad = |msg: &str| Err(PipelineError::InvalidParameter(msg.to_string()));
        if self.n_estimators == 0 {
            return bad("boosting needs at least one round");
        }
        if !(self.learning_rate > 0.0) {
            return bad("learning_rate must be positive");
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return bad("colsample_bytree must be in (0, 1]");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return bad("subsample must be in (0, 1]");
        }
        if let GrowthPolicy::LeafWise { max_leaves } = self.growth {
            if max_leaves < 2 {
                return bad("max_leaves must be at least 2");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBooster {
    name: String,
    params: BoosterParams,
    base_score: f64,
    trees: Vec<Tree>,
    n_features: usize,
}

impl GradientBooster {
    pub fn new(name: impl Into<String>, params: BoosterParams) -> Self {
        GradientBooster {
            name: name.into(),
            params,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Initial margin (log-odds) every prediction starts from.
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Raw log-odds output.
    pub fn predict_margin(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("gradient booster"));
        }
        check_width(self.n_features, x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }
}

impl Classifier for GradientBooster {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        check_training_input(x, y)?;
        self.params.validate()?;
        let n = x.nrows();
        let p = x.ncols();
        let n_pos = y.iter().filter(|&&v| v == 1).count();
        if n_pos == 0 || n_pos == n {
            return Err(PipelineError::DegenerateClass(format!(
                "{} needs both classes in the training labels",
                self.name
            )));
        }

        let weights = row_weights(y, n_pos, self.params.class_weighting);
        let pos_rate = n_pos as f64 / n as f64;
        self.base_score = (pos_rate / (1.0 - pos_rate)).ln();

        let data = BinnedMatrix::new(x, self.params.max_bins);
        let grow_params = GrowParams {
            policy: self.params.growth,
            max_depth: self.params.max_depth,
            lambda: self.params.lambda,
            gamma: self.params.gamma,
            min_child_weight: self.params.min_child_weight,
            min_child_samples: self.params.min_child_samples,
            learning_rate: self.params.learning_rate,
        };
        let n_cols = ((self.params.colsample_bytree * p as f64).round() as usize).clamp(1, p);
        let n_rows = ((self.params.subsample * n as f64).round() as usize).clamp(1, n);
        let sample_rows = self.params.subsample < 1.0 && self.params.subsample_freq > 0;

        let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(self.params.seed, 0));
        let mut margin = vec![self.base_score; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut rows: Vec<usize> = (0..n).collect();
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for round in 0..self.params.n_estimators {
            for i in 0..n {
                let prob = sigmoid(margin[i]);
                grad[i] = weights[i] * (prob - f64::from(y[i]));
                hess[i] = (weights[i] * prob * (1.0 - prob)).max(1e-16);
            }
            if sample_rows && round % self.params.subsample_freq == 0 {
                rows = index::sample(&mut rng, n, n_rows).into_vec();
                rows.sort_unstable();
            }
            let features: Vec<usize> = if n_cols < p {
                let mut f = index::sample(&mut rng, p, n_cols).into_vec();
                f.sort_unstable();
                f
            } else {
                (0..p).collect()
            };

            let tree = grow_tree(&data, &grad, &hess, rows.clone(), &features, &grow_params);
            for (i, row) in x.rows().into_iter().enumerate() {
                margin[i] += tree.predict_row(row);
            }
            trees.push(tree);
        }

        log::debug!(
            "{}: {} rounds on {} rows x {} features (base score {:.4})",
            self.name,
            trees.len(),
            n,
            p,
            self.base_score
        );
        self.trees = trees;
        self.n_features = p;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        Ok(self.predict_margin(x)?.into_iter().map(sigmoid).collect())
    }
}

fn row_weights(y: &[u8], n_pos: usize, weighting: ClassWeighting) -> Vec<f64> {
    let n_neg = y.len() - n_pos;
    let (w0, w1) = match weighting {
        ClassWeighting::None => (1.0, 1.0),
        ClassWeighting::Balanced if n_pos > n_neg => (n_pos as f64 / n_neg as f64, 1.0),
        ClassWeighting::Balanced => (1.0, n_neg as f64 / n_pos as f64),
    };
    y.iter().map(|&v| if v == 1 { w1 } else { w0 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blobs, imbalanced_blobs};
    use approx::assert_relative_eq;

    fn small(params: BoosterParams) -> BoosterParams {
        BoosterParams {
            n_estimators: 20,
            ..params
        }
    }

    #[test]
    fn test_both_policies_learn_separable_problem() {
        let (x, y) = blobs(60);
        for params in [BoosterParams::xgb_member(), BoosterParams::lgbm_member()] {
            let mut model = GradientBooster::new("m", small(params));
            model.fit(&x, &y).unwrap();
            assert_eq!(model.predict(&x).unwrap(), y);
        }
    }

    #[test]
    fn test_base_score_is_log_odds() {
        let (x, y) = imbalanced_blobs(40, 4);
        let mut model = GradientBooster::new("xgb", small(BoosterParams::xgb_member()));
        model.fit(&x, &y).unwrap();
        assert_relative_eq!(model.base_score(), (10.0f64 / 30.0).ln(), epsilon = 1e-12);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_leafwise_respects_leaf_cap() {
        let (x, y) = blobs(200);
        let mut params = small(BoosterParams::lgbm_member());
        params.growth = GrowthPolicy::LeafWise { max_leaves: 4 };
        params.min_child_samples = 1;
        let mut model = GradientBooster::new("lgbm", params);
        model.fit(&x, &y).unwrap();
        assert!(model.trees().iter().all(|t| t.n_leaves() <= 4));
    }

    #[test]
    fn test_balanced_weights() {
        let y = [1, 0, 0, 0];
        assert_eq!(
            row_weights(&y, 1, ClassWeighting::Balanced),
            vec![3.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(row_weights(&y, 1, ClassWeighting::None), vec![1.0; 4]);
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = blobs(6);
        let mut model = GradientBooster::new("xgb", small(BoosterParams::xgb_member()));
        assert!(matches!(
            model.fit(&x, &[0; 6]),
            Err(PipelineError::DegenerateClass(_))
        ));
    }
}
