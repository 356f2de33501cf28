//! Second-order histogram tree growth.
//!
//! Both boosters share this grower; they differ only in the order open leaves
//! are expanded and in whether the leaf count is capped.
use super::GrowthPolicy;
use crate::binning::BinnedMatrix;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowParams {
    pub policy: GrowthPolicy,
    pub max_depth: Option<usize>,
    pub lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    pub min_child_samples: usize,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct GradStats {
    g: f64,
    h: f64,
    n: usize,
}

impl GradStats {
    fn add(&mut self, g: f64, h: f64) {
        self.g += g;
        self.h += h;
        self.n += 1;
    }

    fn minus(&self, other: &GradStats) -> GradStats {
        GradStats {
            g: self.g - other.g,
            h: self.h - other.h,
            n: self.n - other.n,
        }
    }

    fn score(&self, lambda: f64) -> f64 {
        self.g * self.g / (self.h + lambda)
    }

    fn weight(&self, lambda: f64) -> f64 {
        let denom = self.h + lambda;
        if denom <= 0.0 {
            0.0
        } else {
            -self.g / denom
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    gain: f64,
    feature: usize,
    bin: usize,
    left: GradStats,
    right: GradStats,
}

struct OpenLeaf {
    node: usize,
    depth: usize,
    rows: Vec<usize>,
    best: Option<Candidate>,
}

/// Grow one tree on the rows in `rows` using only `features`.
///
/// `grad` and `hess` are indexed by row. Leaf values are already shrunk by
/// the learning rate; node cover is the hessian sum.
pub(crate) fn grow_tree(
    data: &BinnedMatrix,
    grad: &[f64],
    hess: &[f64],
    rows: Vec<usize>,
    features: &[usize],
    params: &GrowParams,
) -> Tree {
    let mut tree = Tree::new();
    let root_stats = sum_stats(&rows, grad, hess);
    let root = tree.push_leaf(
        root_stats.weight(params.lambda) * params.learning_rate,
        root_stats.h,
    );

    let mut open = vec![OpenLeaf {
        node: root,
        depth: 0,
        best: best_split(data, grad, hess, &rows, root_stats, features, params, 0),
        rows,
    }];
    let mut n_leaves = 1usize;

    loop {
        if let GrowthPolicy::LeafWise { max_leaves } = params.policy {
            if n_leaves >= max_leaves {
                break;
            }
        }
        let Some(pick) = next_leaf(&open, params.policy) else {
            break;
        };
        let leaf = open.swap_remove(pick);
        let Some(split) = leaf.best else {
            continue;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = leaf
            .rows
            .iter()
            .partition(|&&r| data.bin(split.feature, r) <= split.bin);
        let (l, r) = tree.split_leaf(
            leaf.node,
            split.feature,
            data.threshold(split.feature, split.bin),
            (
                split.left.weight(params.lambda) * params.learning_rate,
                split.left.h,
            ),
            (
                split.right.weight(params.lambda) * params.learning_rate,
                split.right.h,
            ),
        );
        n_leaves += 1;

        let depth = leaf.depth + 1;
        for (node, rows, stats) in [(l, left_rows, split.left), (r, right_rows, split.right)] {
            let best = best_split(data, grad, hess, &rows, stats, features, params, depth);
            open.push(OpenLeaf {
                node,
                depth,
                rows,
                best,
            });
        }
    }
    tree
}

/// Depth-wise growth expands the shallowest splittable leaf (every leaf with
/// a positive gain is eventually split); leaf-wise growth expands the leaf
/// with the largest gain.
fn next_leaf(open: &[OpenLeaf], policy: GrowthPolicy) -> Option<usize> {
    let splittable = open.iter().enumerate().filter(|(_, l)| l.best.is_some());
    match policy {
        GrowthPolicy::DepthWise => splittable
            .min_by_key(|(_, l)| (l.depth, l.node))
            .map(|(i, _)| i),
        GrowthPolicy::LeafWise { .. } => splittable
            .max_by(|(_, a), (_, b)| {
                let (ga, gb) = (gain_of(a), gain_of(b));
                ga.total_cmp(&gb).then(b.node.cmp(&a.node))
            })
            .map(|(i, _)| i),
    }
}

fn gain_of(leaf: &OpenLeaf) -> f64 {
    leaf.best.map_or(f64::NEG_INFINITY, |c| c.gain)
}

fn sum_stats(rows: &[usize], grad: &[f64], hess: &[f64]) -> GradStats {
    let mut s = GradStats::default();
    for &r in rows {
        s.add(grad[r], hess[r]);
    }
    s
}

#[allow(clippy::too_many_arguments)]
fn best_split(
    data: &BinnedMatrix,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    parent: GradStats,
    features: &[usize],
    params: &GrowParams,
    depth: usize,
) -> Option<Candidate> {
    if params.max_depth.is_some_and(|d| depth >= d) {
        return None;
    }
    if parent.n < 2 * params.min_child_samples.max(1) {
        return None;
    }
    let parent_score = parent.score(params.lambda);
    let mut best: Option<Candidate> = None;

    for &f in features {
        let n_bins = data.n_bins(f);
        if n_bins < 2 {
            continue;
        }
        let mut hist = vec![GradStats::default(); n_bins];
        for &r in rows {
            hist[data.bin(f, r)].add(grad[r], hess[r]);
        }
        let mut left = GradStats::default();
        for (bin, h) in hist.iter().enumerate().take(n_bins - 1) {
            left.g += h.g;
            left.h += h.h;
            left.n += h.n;
            if h.n == 0 {
                continue;
            }
            let right = parent.minus(&left);
            if right.n == 0 {
                break;
            }
            if left.n < params.min_child_samples
                || right.n < params.min_child_samples
                || left.h < params.min_child_weight
                || right.h < params.min_child_weight
            {
                continue;
            }
            let gain = 0.5
                * (left.score(params.lambda) + right.score(params.lambda) - parent_score)
                - params.gamma;
            if gain > SPLIT_EPS && best.map_or(true, |b| gain > b.gain) {
                best = Some(Candidate {
                    gain,
                    feature: f,
                    bin,
                    left,
                    right,
                });
            }
        }
    }
    best
}

const SPLIT_EPS: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(policy: GrowthPolicy) -> GrowParams {
        GrowParams {
            policy,
            max_depth: Some(3),
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 0.0,
            min_child_samples: 1,
            learning_rate: 1.0,
        }
    }

    #[test]
    fn test_single_split_on_step_gradient() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let data = BinnedMatrix::new(&x, 256);
        let grad = [1.0, 1.0, -1.0, -1.0];
        let hess = [1.0; 4];
        let tree = grow_tree(
            &data,
            &grad,
            &hess,
            (0..4).collect(),
            &[0],
            &params(GrowthPolicy::DepthWise),
        );
        // children are pure, so further splits have zero gain
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(array![0.5].view()), -2.0 / 3.0);
        assert_eq!(tree.predict_row(array![2.5].view()), 2.0 / 3.0);
        assert_eq!(tree.nodes()[0].cover(), 4.0);
    }

    #[test]
    fn test_leaf_cap() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let data = BinnedMatrix::new(&x, 256);
        let grad = [3.0, -1.0, 2.0, -3.0, 1.0, -2.0];
        let hess = [1.0; 6];
        let tree = grow_tree(
            &data,
            &grad,
            &hess,
            (0..6).collect(),
            &[0],
            &params(GrowthPolicy::LeafWise { max_leaves: 3 }),
        );
        assert_eq!(tree.n_leaves(), 3);
    }
}
