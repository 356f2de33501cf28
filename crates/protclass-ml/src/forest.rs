//! Bootstrap random forest of gini CART trees.
use crate::binning::{BinnedMatrix, DEFAULT_MAX_BINS};
use crate::cart::{self, CartParams};
use crate::model::{check_training_input, check_width, derive_seed, Classifier};
use crate::tree::Tree;
use crate::{PipelineError, Result};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        RandomForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            max_bins: DEFAULT_MAX_BINS,
            seed: 42,
        }
    }
}

impl RandomForestParams {
    /// The `rf` member of the voting ensemble.
    pub fn ensemble_member() -> Self {
        RandomForestParams {
            n_estimators: 198,
            max_depth: Some(14),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: RandomForestParams,
    trees: Vec<Tree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(params: RandomForestParams) -> Self {
        RandomForest {
            params,
            trees: Vec::new(),
            n_features: 0,
            importances: Vec::new(),
        }
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Mean decrease in impurity, averaged over trees and normalised to sum
    /// to one. Empty before fitting.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn set_n_estimators(&mut self, n: usize) {
        self.params.n_estimators = n;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.params.seed = seed;
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "rf"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        check_training_input(x, y)?;
        if self.params.n_estimators == 0 {
            return Err(PipelineError::InvalidParameter(
                "random forest needs at least one tree".into(),
            ));
        }
        let n = x.nrows();
        let p = x.ncols();
        let data = BinnedMatrix::new(x, self.params.max_bins);
        let cart_params = CartParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features: ((p as f64).sqrt().floor() as usize).max(1),
        };

        let fitted: Vec<cart::FittedCart> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(self.params.seed, t as u64));
                let weights = if self.params.bootstrap {
                    let mut w = vec![0.0; n];
                    for _ in 0..n {
                        w[rng.gen_range(0..n)] += 1.0;
                    }
                    w
                } else {
                    vec![1.0; n]
                };
                cart::grow(&data, y, &weights, &cart_params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; p];
        let mut contributing = 0usize;
        for f in &fitted {
            if f.tree.n_leaves() > 1 {
                contributing += 1;
                importances
                    .iter_mut()
                    .zip(&f.importances)
                    .for_each(|(acc, v)| *acc += v);
            }
        }
        let total: f64 = importances.iter().sum();
        if contributing > 0 && total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        log::debug!(
            "random forest: {} trees on {} rows x {} features",
            fitted.len(),
            n,
            p
        );
        self.trees = fitted.into_iter().map(|f| f.tree).collect();
        self.importances = importances;
        self.n_features = p;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("rf"));
        }
        check_width(self.n_features, x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::blobs;

    #[test]
    fn test_learns_separable_problem() {
        let (x, y) = blobs(80);
        let mut rf = RandomForest::new(RandomForestParams {
            n_estimators: 25,
            ..Default::default()
        });
        rf.fit(&x, &y).unwrap();
        let pred = rf.predict(&x).unwrap();
        assert_eq!(pred, y);
        let imp = rf.feature_importances();
        assert!(imp[0] > imp[1]);
        approx::assert_relative_eq!(imp.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = blobs(40);
        let params = RandomForestParams {
            n_estimators: 8,
            ..Default::default()
        };
        let mut a = RandomForest::new(params.clone());
        let mut b = RandomForest::new(params);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_unfitted_and_width_errors() {
        let (x, y) = blobs(10);
        let rf = RandomForest::new(RandomForestParams::default());
        assert!(matches!(rf.predict_proba(&x), Err(PipelineError::NotFitted(_))));
        let mut rf = rf;
        rf.set_n_estimators(3);
        rf.fit(&x, &y).unwrap();
        let narrow = Array2::zeros((2, 1));
        assert!(matches!(
            rf.predict_proba(&narrow),
            Err(PipelineError::FeatureCountMismatch { .. })
        ));
    }
}
