//! Classifier contract shared by the ensemble members.
use crate::{PipelineError, Result};
use ndarray::Array2;

/// Binary classifier over a dense feature matrix. Labels are `0` or `1`.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Probability of class 1 for every row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Class 1 iff its probability is strictly above one half.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

pub(crate) fn check_training_input(x: &Array2<f64>, y: &[u8]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::LengthMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PipelineError::EmptyData);
    }
    if let Some(bad) = y.iter().position(|&v| v > 1) {
        return Err(PipelineError::InvalidLabel {
            row: bad,
            value: y[bad].to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(PipelineError::FeatureCountMismatch {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

/// Independent, reproducible seed for stream `stream` of a base seed
/// (splitmix64 finaliser).
pub(crate) fn derive_seed(base: u64, stream: u64) -> u64 {
    let mut z = base
        .wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
