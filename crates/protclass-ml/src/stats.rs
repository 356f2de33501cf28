//! Small statistical helpers: binomial tails, FDR control, order statistics.

fn ln_choose(n: u64, k: u64) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(0.0, |acc, i| acc + ((n - i) as f64).ln() - ((i + 1) as f64).ln())
}

fn binom_pmf(i: u64, n: u64, p: f64) -> f64 {
    if p == 0.0 {
        return if i == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if i == n { 1.0 } else { 0.0 };
    }
    (ln_choose(n, i) + i as f64 * p.ln() + (n - i) as f64 * (1.0 - p).ln()).exp()
}

/// `P(X <= k)` for `X ~ Binomial(n, p)`.
pub fn binom_cdf(k: i64, n: u64, p: f64) -> f64 {
    if k < 0 {
        return 0.0;
    }
    let k = k as u64;
    if k >= n {
        return 1.0;
    }
    (0..=k).map(|i| binom_pmf(i, n, p)).sum::<f64>().min(1.0)
}

/// `P(X > k)` for `X ~ Binomial(n, p)`.
pub fn binom_sf(k: i64, n: u64, p: f64) -> f64 {
    if k < 0 {
        return 1.0;
    }
    let k = k as u64;
    if k >= n {
        return 0.0;
    }
    ((k + 1)..=n).map(|i| binom_pmf(i, n, p)).sum::<f64>().min(1.0)
}

/// Benjamini-Hochberg: which hypotheses are rejected at false discovery rate
/// `alpha`.
pub fn fdr_bh(pvals: &[f64], alpha: f64) -> Vec<bool> {
    let n = pvals.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| pvals[a].total_cmp(&pvals[b]));

    let mut cutoff = None;
    for (rank, &idx) in order.iter().enumerate() {
        if pvals[idx] <= alpha * (rank + 1) as f64 / n as f64 {
            cutoff = Some(rank);
        }
    }
    let mut reject = vec![false; n];
    if let Some(last) = cutoff {
        for &idx in &order[..=last] {
            reject[idx] = true;
        }
    }
    reject
}

/// Median of the finite values, or NaN when there are none.
pub fn nan_median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Linear-interpolated percentile (`q` in 0..=100) of the finite values.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let pos = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_binomial_tails() {
        // n = 4, p = .5: pmf 1,4,6,4,1 / 16
        assert_relative_eq!(binom_cdf(1, 4, 0.5), 5.0 / 16.0, epsilon = 1e-12);
        assert_relative_eq!(binom_sf(1, 4, 0.5), 11.0 / 16.0, epsilon = 1e-12);
        assert_eq!(binom_sf(-1, 4, 0.5), 1.0);
        assert_eq!(binom_cdf(4, 4, 0.5), 1.0);
        assert_relative_eq!(
            binom_cdf(30, 100, 0.5) + binom_sf(30, 100, 0.5),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_fdr_bh() {
        let p = [0.01, 0.04, 0.03, 0.5];
        // sorted .01 .03 .04 .5 vs .0125 .025 .0375 .05
        assert_eq!(fdr_bh(&p, 0.05), vec![true, false, false, false]);
        let p = [0.001, 0.002, 0.003];
        assert_eq!(fdr_bh(&p, 0.05), vec![true, true, true]);
    }

    #[test]
    fn test_percentile() {
        let v = [3.0, 1.0, f64::NAN, 2.0, 4.0];
        assert_eq!(nan_median(&v), 2.5);
        assert_eq!(percentile(&v, 100.0), 4.0);
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert!(nan_median(&[]).is_nan());
    }
}
