//! SVM-SMOTE minority oversampling (Nguyen, Cooper & Kamei, 2011).
//!
//! Synthetic minority rows are generated around the minority-class support
//! vectors of an RBF SVM. Support vectors close to the class boundary
//! ("danger") interpolate toward minority neighbours; the others ("safe")
//! extrapolate away from them.
use crate::neighbors::NearestNeighbors;
use crate::svm::{fit_svc, SvmParams};
use crate::{PipelineError, Result};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Beta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoteParams {
    pub k_neighbors: usize,
    pub m_neighbors: usize,
    pub out_step: f64,
    pub svm_c: f64,
    pub seed: u64,
}

impl Default for SmoteParams {
    fn default() -> Self {
        SmoteParams {
            k_neighbors: 5,
            m_neighbors: 10,
            out_step: 0.5,
            svm_c: 1.0,
            seed: 42,
        }
    }
}

/// Balanced training data: the original rows first, synthetic rows after.
#[derive(Debug, Clone)]
pub struct Resampled {
    pub x: Array2<f64>,
    pub y: Vec<u8>,
    pub n_synthetic: usize,
}

pub fn svm_smote(x: &Array2<f64>, y: &[u8], params: &SmoteParams) -> Result<Resampled> {
    if x.nrows() != y.len() {
        return Err(PipelineError::LengthMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    let n_pos = y.iter().filter(|&&v| v == 1).count();
    let n_neg = y.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::DegenerateClass(
            "both classes must be present".into(),
        ));
    }
    if n_pos == n_neg {
        return Ok(Resampled {
            x: x.clone(),
            y: y.to_vec(),
            n_synthetic: 0,
        });
    }
    let (minority, n_min, n_maj) = if n_pos < n_neg {
        (1u8, n_pos, n_neg)
    } else {
        (0u8, n_neg, n_pos)
    };
    let k = params.k_neighbors;
    let m = params.m_neighbors;
    if n_min < k + 1 {
        return Err(PipelineError::DegenerateClass(format!(
            "minority class has {n_min} samples, need at least {}",
            k + 1
        )));
    }
    let n_samples = n_maj - n_min;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let svm = fit_svc(
        x,
        y,
        &SvmParams {
            c: params.svm_c,
            ..Default::default()
        },
    )?;
    let support: Vec<usize> = svm
        .support_indices()
        .into_iter()
        .filter(|&i| y[i] == minority)
        .collect();

    // classify minority support vectors by their m nearest neighbours
    let all = NearestNeighbors::new(x.view());
    let support_x = x.select(Axis(0), &support);
    let neighbourhoods = all.query_rows(support_x.view(), m + 1);
    let mut danger = Vec::new();
    let mut safe = Vec::new();
    for (sv, nbrs) in support.iter().zip(&neighbourhoods) {
        let n_majority = nbrs[1..].iter().filter(|&&i| y[i] != minority).count();
        if n_majority == m {
            continue;
        }
        if n_majority as f64 >= m as f64 / 2.0 {
            danger.push(*sv);
        } else {
            safe.push(*sv);
        }
    }
    if danger.is_empty() && safe.is_empty() {
        return Err(PipelineError::DegenerateClass(
            "all support vectors are considered noise".into(),
        ));
    }

    let minority_rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority).collect();
    let minority_x = x.select(Axis(0), &minority_rows);
    let within = NearestNeighbors::new(minority_x.view());

    let beta = Beta::new(10.0, 10.0)
        .map_err(|e| PipelineError::InvalidParameter(format!("beta distribution: {e}")))?;
    let fraction: f64 = beta.sample(&mut rng);
    let n_danger = ((fraction * (n_samples + 1) as f64).floor() as usize).min(n_samples);

    let mut synthetic: Vec<Array2<f64>> = Vec::new();
    if !danger.is_empty() {
        let base = x.select(Axis(0), &danger);
        let nn = neighbour_table(&within, base.view(), k);
        synthetic.push(generate(&base, &minority_x, &nn, n_danger, 1.0, &mut rng));
    }
    if !safe.is_empty() {
        let base = x.select(Axis(0), &safe);
        let nn = neighbour_table(&within, base.view(), k);
        synthetic.push(generate(
            &base,
            &minority_x,
            &nn,
            n_samples - n_danger,
            -params.out_step,
            &mut rng,
        ));
    }

    let mut parts: Vec<ArrayView2<f64>> = vec![x.view()];
    parts.extend(synthetic.iter().map(|s| s.view()));
    let out = concatenate(Axis(0), &parts)
        .map_err(|e| PipelineError::InvalidParameter(format!("stacking samples: {e}")))?;
    let n_synthetic = out.nrows() - x.nrows();
    let mut labels = y.to_vec();
    labels.extend(std::iter::repeat(minority).take(n_synthetic));

    log::info!(
        "SVM-SMOTE: {} danger / {} safe support vectors, {} synthetic samples of class {}",
        danger.len(),
        safe.len(),
        n_synthetic,
        minority
    );
    Ok(Resampled {
        x: out,
        y: labels,
        n_synthetic,
    })
}

// Helper Functions ----------------------------------------------------------

/// The `k` nearest minority rows of each base row, excluding the closest
/// (the row itself).
fn neighbour_table(
    within: &NearestNeighbors,
    base: ArrayView2<f64>,
    k: usize,
) -> Vec<Vec<usize>> {
    within
        .query_rows(base, k + 1)
        .into_iter()
        .map(|nbrs| nbrs.into_iter().skip(1).collect())
        .collect()
}

/// `n` rows of `base[r] + step * U(0,1) * (minority[nn[r][c]] - base[r])` with
/// `(r, c)` drawn uniformly over the neighbour table.
fn generate<R: Rng>(
    base: &Array2<f64>,
    minority: &Array2<f64>,
    nn: &[Vec<usize>],
    n: usize,
    step_size: f64,
    rng: &mut R,
) -> Array2<f64> {
    let k = nn.first().map_or(0, Vec::len);
    if k == 0 {
        return Array2::zeros((0, base.ncols()));
    }
    let mut out = Array2::zeros((n, base.ncols()));
    for mut row in out.rows_mut() {
        let pick = rng.gen_range(0..base.nrows() * k);
        let (r, c) = (pick / k, pick % k);
        let step = step_size * rng.gen::<f64>();
        let origin = base.row(r);
        let target = minority.row(nn[r][c]);
        for ((o, &a), &b) in row.iter_mut().zip(origin.iter()).zip(target.iter()) {
            *o = a + step * (b - a);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::imbalanced_blobs;

    #[test]
    fn test_balances_and_keeps_originals_first() {
        let (x, y) = imbalanced_blobs(60, 4);
        let out = svm_smote(&x, &y, &SmoteParams::default()).unwrap();
        assert_eq!(out.x.slice(ndarray::s![..60, ..]), x);
        assert_eq!(&out.y[..60], &y[..]);
        assert!(out.n_synthetic > 0);
        assert!(out.y[60..].iter().all(|&v| v == 1));
        let n_pos = out.y.iter().filter(|&&v| v == 1).count();
        assert!(n_pos <= out.y.len() - n_pos);
        assert_eq!(out.x.nrows(), out.y.len());
    }

    #[test]
    fn test_balanced_input_unchanged() {
        let (x, y) = crate::testing::blobs(20);
        let out = svm_smote(&x, &y, &SmoteParams::default()).unwrap();
        assert_eq!(out.x, x);
        assert_eq!(out.n_synthetic, 0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let (x, _) = imbalanced_blobs(20, 4);
        assert!(matches!(
            svm_smote(&x, &[0; 20], &SmoteParams::default()),
            Err(PipelineError::DegenerateClass(_))
        ));
        // only 3 minority rows, fewer than k + 1
        let y: Vec<u8> = (0..20).map(|i| u8::from(i < 3)).collect();
        assert!(matches!(
            svm_smote(&x, &y, &SmoteParams::default()),
            Err(PipelineError::DegenerateClass(_))
        ));
    }

    #[test]
    fn test_generated_points_lie_on_segments() {
        let base = ndarray::array![[0.0, 0.0]];
        let minority = ndarray::array![[0.0, 0.0], [2.0, 2.0]];
        let nn = vec![vec![1]];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = generate(&base, &minority, &nn, 5, 1.0, &mut rng);
        for row in out.rows() {
            assert_eq!(row[0], row[1]);
            assert!((0.0..=2.0).contains(&row[0]));
        }
        let out = generate(&base, &minority, &nn, 5, -0.5, &mut rng);
        assert!(out.iter().all(|&v| (-1.0..=0.0).contains(&v)));
    }
}
