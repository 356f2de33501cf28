//! Gini CART on histogram bins, grown for the random forest.
use crate::binning::BinnedMatrix;
use crate::tree::Tree;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CartParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

pub(crate) struct FittedCart {
    pub tree: Tree,
    /// Weighted impurity decrease per feature, normalised to sum to 1 (all
    /// zeros for a single-leaf tree).
    pub importances: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClassWeights {
    w0: f64,
    w1: f64,
    count: usize,
}

impl ClassWeights {
    fn add(&mut self, label: u8, w: f64) {
        if label == 1 {
            self.w1 += w;
        } else {
            self.w0 += w;
        }
        self.count += 1;
    }

    fn total(&self) -> f64 {
        self.w0 + self.w1
    }

    fn gini(&self) -> f64 {
        let t = self.total();
        if t <= 0.0 {
            return 0.0;
        }
        let (p0, p1) = (self.w0 / t, self.w1 / t);
        1.0 - p0 * p0 - p1 * p1
    }

    fn minus(&self, other: &ClassWeights) -> ClassWeights {
        ClassWeights {
            w0: self.w0 - other.w0,
            w1: self.w1 - other.w1,
            count: self.count - other.count,
        }
    }
}

struct BestSplit {
    feature: usize,
    bin: usize,
    left: ClassWeights,
    right: ClassWeights,
    left_rows: Vec<usize>,
    right_rows: Vec<usize>,
}

/// Grow one tree. `weights[i]` is the bootstrap multiplicity of row `i`;
/// rows with zero weight are ignored.
pub(crate) fn grow<R: Rng>(
    data: &BinnedMatrix,
    y: &[u8],
    weights: &[f64],
    params: &CartParams,
    rng: &mut R,
) -> FittedCart {
    let n_features = data.n_features();
    let mut importances = vec![0.0; n_features];
    let mut tree = Tree::new();

    let rows: Vec<usize> = (0..y.len()).filter(|&i| weights[i] > 0.0).collect();
    let stats = node_stats(&rows, y, weights);
    let root_weight = stats.total();
    let root = tree.push_leaf(leaf_value(&stats), root_weight);

    let mut stack = vec![(root, rows, stats, 0usize)];
    let mut features: Vec<usize> = (0..n_features).collect();
    while let Some((node, rows, stats, depth)) = stack.pop() {
        let at_depth_limit = params.max_depth.is_some_and(|d| depth >= d);
        if at_depth_limit
            || stats.count < params.min_samples_split
            || stats.count < 2 * params.min_samples_leaf
            || stats.gini() <= 0.0
        {
            continue;
        }
        features.shuffle(rng);
        let Some(best) = find_split(data, y, weights, &rows, &features, params) else {
            continue;
        };

        importances[best.feature] += stats.total() * stats.gini()
            - best.left.total() * best.left.gini()
            - best.right.total() * best.right.gini();
        let (l, r) = tree.split_leaf(
            node,
            best.feature,
            data.threshold(best.feature, best.bin),
            (leaf_value(&best.left), best.left.total()),
            (leaf_value(&best.right), best.right.total()),
        );
        stack.push((r, best.right_rows, best.right, depth + 1));
        stack.push((l, best.left_rows, best.left, depth + 1));
    }

    let total: f64 = importances.iter().sum();
    if total > 0.0 && root_weight > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    } else {
        importances.iter_mut().for_each(|v| *v = 0.0);
    }
    FittedCart { tree, importances }
}

// Helper Functions ----------------------------------------------------------

fn node_stats(rows: &[usize], y: &[u8], weights: &[f64]) -> ClassWeights {
    let mut s = ClassWeights::default();
    for &r in rows {
        s.add(y[r], weights[r]);
    }
    s
}

fn leaf_value(stats: &ClassWeights) -> f64 {
    let t = stats.total();
    if t > 0.0 {
        stats.w1 / t
    } else {
        0.0
    }
}

/// Visit features in the (shuffled) order given until `max_features`
/// non-constant ones have been evaluated, keeping the split with the lowest
/// weighted child impurity.
fn find_split(
    data: &BinnedMatrix,
    y: &[u8],
    weights: &[f64],
    rows: &[usize],
    features: &[usize],
    params: &CartParams,
) -> Option<BestSplit> {
    let mut visited = 0;
    let mut best: Option<(f64, usize, usize, ClassWeights, ClassWeights)> = None;
    let parent = node_stats(rows, y, weights);

    for &f in features {
        if visited >= params.max_features {
            break;
        }
        let mut hist = vec![ClassWeights::default(); data.n_bins(f)];
        for &r in rows {
            hist[data.bin(f, r)].add(y[r], weights[r]);
        }
        if hist.iter().filter(|h| h.count > 0).count() < 2 {
            continue;
        }
        visited += 1;

        let mut left = ClassWeights::default();
        for (bin, h) in hist.iter().enumerate().take(hist.len() - 1) {
            left.w0 += h.w0;
            left.w1 += h.w1;
            left.count += h.count;
            if h.count == 0 {
                continue;
            }
            let right = parent.minus(&left);
            if left.count < params.min_samples_leaf
                || right.count < params.min_samples_leaf
                || right.count == 0
            {
                continue;
            }
            let child_impurity = left.total() * left.gini() + right.total() * right.gini();
            if best.as_ref().map_or(true, |b| child_impurity < b.0) {
                best = Some((child_impurity, f, bin, left, right));
            }
        }
    }

    let (_, feature, bin, left, right) = best?;
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
        rows.iter().partition(|&&r| data.bin(feature, r) <= bin);
    Some(BestSplit {
        feature,
        bin,
        left,
        right,
        left_rows,
        right_rows,
    })
}
