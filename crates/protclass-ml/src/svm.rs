//! RBF-kernel C-SVC trained with sequential minimal optimisation.
//!
//! Only the dual solution is needed by SVM-SMOTE (which rows end up as support
//! vectors), so the solver stops at the KKT tolerance and reports the
//! multipliers. Working-set selection uses second-order information (Fan,
//! Chen & Lin, 2005).
use crate::{PipelineError, Result};
use ndarray::{Array2, ArrayView1};
use std::collections::{HashMap, VecDeque};

const TAU: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    pub c: f64,
    /// Kernel width; `None` uses `1 / (n_features * var(X))`.
    pub gamma: Option<f64>,
    pub tolerance: f64,
    /// Bytes of kernel rows kept in the cache.
    pub cache_bytes: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        SvmParams {
            c: 1.0,
            gamma: None,
            tolerance: 1e-3,
            cache_bytes: 200 << 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvmSolution {
    pub alpha: Vec<f64>,
    pub gamma: f64,
    pub iterations: usize,
}

impl SvmSolution {
    /// Rows with a non-zero dual coefficient, ascending.
    pub fn support_indices(&self) -> Vec<usize> {
        self.alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| (a > 0.0).then_some(i))
            .collect()
    }
}

/// `1 / (n_features * variance of every entry of x)`, or 1 for a constant
/// matrix.
pub fn scale_gamma(x: &Array2<f64>) -> f64 {
    let n = x.len() as f64;
    if n == 0.0 {
        return 1.0;
    }
    let mean = x.sum() / n;
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if var > 0.0 {
        1.0 / (x.ncols() as f64 * var)
    } else {
        1.0
    }
}

struct KernelRows<'a> {
    x: &'a Array2<f64>,
    y: Vec<f64>,
    sq_norms: Vec<f64>,
    gamma: f64,
    cache: HashMap<usize, Vec<f64>>,
    order: VecDeque<usize>,
    capacity: usize,
}

impl<'a> KernelRows<'a> {
    fn new(x: &'a Array2<f64>, y: Vec<f64>, gamma: f64, cache_bytes: usize) -> Self {
        let sq_norms = x.rows().into_iter().map(|r| r.dot(&r)).collect();
        let row_bytes = x.nrows().max(1) * std::mem::size_of::<f64>();
        KernelRows {
            x,
            y,
            sq_norms,
            gamma,
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity: (cache_bytes / row_bytes).max(2),
        }
    }

    fn kernel(&self, a: ArrayView1<f64>, i: usize, j: usize) -> f64 {
        let d = self.sq_norms[i] + self.sq_norms[j] - 2.0 * a.dot(&self.x.row(j));
        (-self.gamma * d.max(0.0)).exp()
    }

    /// Row `i` of `Q = y_i y_j K(x_i, x_j)`.
    fn q_row(&mut self, i: usize) -> &[f64] {
        if !self.cache.contains_key(&i) {
            if self.order.len() >= self.capacity {
                if let Some(evict) = self.order.pop_front() {
                    self.cache.remove(&evict);
                }
            }
            let xi = self.x.row(i);
            let row: Vec<f64> = (0..self.x.nrows())
                .map(|j| self.y[i] * self.y[j] * self.kernel(xi, i, j))
                .collect();
            self.cache.insert(i, row);
            self.order.push_back(i);
        }
        &self.cache[&i]
    }
}

/// Solve the C-SVC dual for labels in `{0, 1}`.
pub fn fit_svc(x: &Array2<f64>, labels: &[u8], params: &SvmParams) -> Result<SvmSolution> {
    let n = x.nrows();
    if n != labels.len() {
        return Err(PipelineError::LengthMismatch {
            rows: n,
            labels: labels.len(),
        });
    }
    if n == 0 {
        return Err(PipelineError::EmptyData);
    }
    let gamma = params.gamma.unwrap_or_else(|| scale_gamma(x));
    let c = params.c;
    let y: Vec<f64> = labels
        .iter()
        .map(|&l| if l == 1 { 1.0 } else { -1.0 })
        .collect();

    let mut kernel = KernelRows::new(x, y.clone(), gamma, params.cache_bytes);
    // Q_ii = K(x_i, x_i) = 1 for the RBF kernel
    let qd = vec![1.0; n];
    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let max_iter = (100 * n).max(10_000_000);

    let upper = |a: f64| a >= c;
    let lower = |a: f64| a <= 0.0;

    let mut iter = 0;
    while iter < max_iter {
        // select i
        let mut gmax = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..n {
            let v = if y[t] > 0.0 {
                (!upper(alpha[t])).then_some(-grad[t])
            } else {
                (!lower(alpha[t])).then_some(grad[t])
            };
            if let Some(v) = v {
                if v >= gmax {
                    gmax = v;
                    i_sel = Some(t);
                }
            }
        }
        let Some(i) = i_sel else { break };
        let q_i = kernel.q_row(i).to_vec();

        // select j
        let mut gmax2 = f64::NEG_INFINITY;
        let mut obj_min = f64::INFINITY;
        let mut j_sel = None;
        for t in 0..n {
            let (eligible, g_t, coef_sign) = if y[t] > 0.0 {
                (!lower(alpha[t]), grad[t], -1.0)
            } else {
                (!upper(alpha[t]), -grad[t], 1.0)
            };
            if !eligible {
                continue;
            }
            gmax2 = gmax2.max(g_t);
            let grad_diff = gmax + g_t;
            if grad_diff > 0.0 {
                let quad = qd[i] + qd[t] + 2.0 * coef_sign * y[i] * q_i[t];
                let quad = if quad > 0.0 { quad } else { TAU };
                let obj = -(grad_diff * grad_diff) / quad;
                if obj <= obj_min {
                    obj_min = obj;
                    j_sel = Some(t);
                }
            }
        }
        if gmax + gmax2 < params.tolerance {
            break;
        }
        let Some(j) = j_sel else { break };
        let q_j = kernel.q_row(j).to_vec();
        iter += 1;

        let (old_i, old_j) = (alpha[i], alpha[j]);
        if y[i] != y[j] {
            let quad = (qd[i] + qd[j] + 2.0 * q_i[j]).max(TAU);
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let quad = (qd[i] + qd[j] - 2.0 * q_i[j]).max(TAU);
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (di, dj) = (alpha[i] - old_i, alpha[j] - old_j);
        for k in 0..n {
            grad[k] += q_i[k] * di + q_j[k] * dj;
        }
    }
    if iter >= max_iter {
        log::warn!("SVM solver reached the iteration limit ({max_iter})");
    }
    log::debug!("SVM converged after {iter} iterations (gamma {gamma:.4})");
    Ok(SvmSolution {
        alpha,
        gamma,
        iterations: iter,
    })
}
