//! Shared fixtures for unit tests.
use crate::EnsembleParams;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Two classes separated along feature 0 (gap of 0.4); feature 1 is noise.
/// Labels alternate 0, 1, 0, 1, ...
pub(crate) fn blobs(n: usize) -> (Array2<f64>, Vec<u8>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let label = (i % 2) as f64;
        if j == 0 {
            label * 2.0 + rng.gen_range(-0.8..0.8)
        } else {
            rng.gen_range(0.0..1.0)
        }
    });
    let y = (0..n).map(|i| (i % 2) as u8).collect();
    (x, y)
}

/// Like [`blobs`] but only every `ratio`-th row is class 1.
pub(crate) fn imbalanced_blobs(n: usize, ratio: usize) -> (Array2<f64>, Vec<u8>) {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let y: Vec<u8> = (0..n).map(|i| u8::from(i % ratio == 0)).collect();
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        let label = f64::from(y[i]);
        if j == 0 {
            label * 2.0 + rng.gen_range(-0.9..0.9)
        } else {
            label + rng.gen_range(-0.9..0.9)
        }
    });
    (x, y)
}

/// Ensemble small enough for fast unit tests.
pub(crate) fn small_ensemble_params() -> EnsembleParams {
    let mut params = EnsembleParams::default();
    params.xgb.n_estimators = 15;
    params.lgbm.n_estimators = 15;
    params.lgbm.min_child_samples = 5;
    params.rf.n_estimators = 15;
    params
}
