//! Quantile histogram bins shared by the tree learners.
//!
//! A feature with at most `max_bins` distinct values gets a cut between every
//! pair of neighbouring values, so histogram splits coincide with exact ones.
//! Denser features are cut at evenly spaced quantiles.
use ndarray::Array2;

pub const DEFAULT_MAX_BINS: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    /// Column-major bin indices, `bins[feature][row]`.
    bins: Vec<Vec<u16>>,
    /// Sorted cut points per feature; bin `b` holds values in
    /// `(cuts[b-1], cuts[b]]`.
    cuts: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    pub fn new(x: &Array2<f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, u16::MAX as usize);
        let mut bins = Vec::with_capacity(x.ncols());
        let mut cuts = Vec::with_capacity(x.ncols());
        for column in x.columns() {
            let feature_cuts = cut_points(column.iter().copied(), max_bins);
            bins.push(
                column
                    .iter()
                    .map(|&v| bin_of(&feature_cuts, v))
                    .collect(),
            );
            cuts.push(feature_cuts);
        }
        BinnedMatrix { bins, cuts }
    }

    pub fn n_features(&self) -> usize {
        self.bins.len()
    }

    pub fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len() + 1
    }

    #[inline]
    pub fn bin(&self, feature: usize, row: usize) -> usize {
        self.bins[feature][row] as usize
    }

    /// Threshold separating bins `..=bin` from the rest: `x <= threshold`.
    pub fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.cuts[feature][bin]
    }
}

fn bin_of(cuts: &[f64], v: f64) -> u16 {
    cuts.partition_point(|&t| t < v) as u16
}

fn cut_points(values: impl Iterator<Item = f64>, max_bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.len() <= max_bins {
        return distinct.windows(2).map(|w| midpoint(w[0], w[1])).collect();
    }

    let n = sorted.len();
    let mut cuts: Vec<f64> = Vec::with_capacity(max_bins);
    for b in 1..max_bins {
        let idx = (b * n / max_bins).min(n - 1);
        let (lo, hi) = (sorted[idx.saturating_sub(1)], sorted[idx]);
        if lo == hi {
            continue;
        }
        let cut = midpoint(lo, hi);
        if cuts.last().map_or(true, |&last| cut > last) {
            cuts.push(cut);
        }
    }
    cuts
}

fn midpoint(a: f64, b: f64) -> f64 {
    let m = a + (b - a) / 2.0;
    // guard against rounding up to `b`
    if m >= b {
        a
    } else {
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_exact_cuts_for_few_values() {
        let x = array![[0.0], [1.0], [1.0], [3.0]];
        let b = BinnedMatrix::new(&x, 256);
        assert_eq!(b.n_bins(0), 3);
        assert_eq!(b.threshold(0, 0), 0.5);
        assert_eq!(b.threshold(0, 1), 2.0);
        assert_eq!((0..4).map(|r| b.bin(0, r)).collect::<Vec<_>>(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_bin_matches_threshold_rule() {
        let x = ndarray::Array2::from_shape_fn((1000, 1), |(i, _)| ((i * 37) % 1000) as f64);
        let b = BinnedMatrix::new(&x, 16);
        assert!(b.n_bins(0) <= 16);
        for row in 0..1000 {
            let v = x[[row, 0]];
            let bin = b.bin(0, row);
            for k in 0..b.n_bins(0) - 1 {
                assert_eq!(bin <= k, v <= b.threshold(0, k));
            }
        }
    }

    #[test]
    fn test_constant_feature_has_one_bin() {
        let x = array![[2.0], [2.0]];
        assert_eq!(BinnedMatrix::new(&x, 256).n_bins(0), 1);
    }
}
