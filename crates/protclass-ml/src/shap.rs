//! Exact path-dependent TreeSHAP (Lundberg, Erion & Lee, 2018).
//!
//! Explains the raw margin of a [`GradientBooster`]. Node cover is used as the
//! background distribution, so `expected_value + Σ φ = margin` holds for
//! every row.
use crate::gbdt::GradientBooster;
use crate::model::check_width;
use crate::tree::{Node, Tree};
use crate::{PipelineError, Result};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

/// Per-row feature attributions.
#[derive(Debug, Clone)]
pub struct ShapValues {
    pub expected_value: f64,
    /// `rows x features`.
    pub values: Array2<f64>,
    /// The explained inputs, kept for colouring plots by feature value.
    pub data: Array2<f64>,
    pub feature_names: Vec<String>,
}

impl ShapValues {
    /// Mean |φ| per feature.
    pub fn mean_abs(&self) -> Vec<f64> {
        let n = self.values.nrows().max(1) as f64;
        self.values
            .columns()
            .into_iter()
            .map(|c| c.iter().map(|v| v.abs()).sum::<f64>() / n)
            .collect()
    }

    /// Feature indices by decreasing mean |φ|.
    pub fn ranking(&self) -> Vec<usize> {
        let importance = self.mean_abs();
        let mut order: Vec<usize> = (0..importance.len()).collect();
        order.sort_by(|&a, &b| importance[b].total_cmp(&importance[a]).then(a.cmp(&b)));
        order
    }
}

pub struct TreeExplainer<'a> {
    model: &'a GradientBooster,
}

impl<'a> TreeExplainer<'a> {
    pub fn new(model: &'a GradientBooster) -> Result<Self> {
        if !model.is_fitted() {
            return Err(PipelineError::NotFitted("gradient booster"));
        }
        Ok(TreeExplainer { model })
    }

    /// Margin predicted for an input carrying no information.
    pub fn expected_value(&self) -> f64 {
        self.model.base_score()
            + self
                .model
                .trees()
                .iter()
                .map(Tree::expected_value)
                .sum::<f64>()
    }

    pub fn shap_values(&self, x: &Array2<f64>, feature_names: &[String]) -> Result<ShapValues> {
        check_width(self.model.n_features(), x)?;
        if feature_names.len() != x.ncols() {
            return Err(PipelineError::FeatureCountMismatch {
                expected: x.ncols(),
                found: feature_names.len(),
            });
        }
        let p = x.ncols();
        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let mut phi = vec![0.0; p];
                for tree in self.model.trees() {
                    tree_shap(tree, x.row(i), &mut phi);
                }
                phi
            })
            .collect();
        let mut values = Array2::zeros((x.nrows(), p));
        for (i, phi) in rows.into_iter().enumerate() {
            values.row_mut(i).iter_mut().zip(phi).for_each(|(v, p)| *v = p);
        }
        Ok(ShapValues {
            expected_value: self.expected_value(),
            values,
            data: x.clone(),
            feature_names: feature_names.to_vec(),
        })
    }
}

// Path algorithm ------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

fn tree_shap(tree: &Tree, x: ArrayView1<f64>, phi: &mut [f64]) {
    if tree.nodes().is_empty() {
        return;
    }
    recurse(tree, x, phi, 0, Vec::new(), 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    x: ArrayView1<f64>,
    phi: &mut [f64],
    node: usize,
    mut path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    extend(&mut path, zero_fraction, one_fraction, feature);
    match &tree.nodes()[node] {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let w = unwound_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
                }
            }
        }
        Node::Split {
            feature: split,
            threshold,
            left,
            right,
            cover,
        } => {
            let (hot, cold) = if x[*split] <= *threshold {
                (*left, *right)
            } else {
                (*right, *left)
            };
            let (mut incoming_zero, mut incoming_one) = (1.0, 1.0);
            if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(*split)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind(&mut path, k);
            }
            let hot_cover = tree.nodes()[hot].cover();
            let cold_cover = tree.nodes()[cold].cover();
            let (hot_frac, cold_frac) = if *cover > 0.0 {
                (hot_cover / cover, cold_cover / cover)
            } else {
                (0.5, 0.5)
            };
            recurse(
                tree,
                x,
                phi,
                hot,
                path.clone(),
                incoming_zero * hot_frac,
                incoming_one,
                Some(*split),
            );
            recurse(
                tree,
                x,
                phi,
                cold,
                path,
                incoming_zero * cold_frac,
                0.0,
                Some(*split),
            );
        }
    }
}

fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / (depth + 1) as f64;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / (depth + 1) as f64;
    }
}

fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let mut next = path[depth].weight;
    for j in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[j].weight;
            path[j].weight = next * (depth + 1) as f64 / ((j + 1) as f64 * one);
            next = tmp - path[j].weight * zero * (depth - j) as f64 / (depth + 1) as f64;
        } else {
            path[j].weight = path[j].weight * (depth + 1) as f64 / (zero * (depth - j) as f64);
        }
    }
    for j in index..depth {
        path[j].feature = path[j + 1].feature;
        path[j].zero_fraction = path[j + 1].zero_fraction;
        path[j].one_fraction = path[j + 1].one_fraction;
    }
    path.pop();
}

fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let mut next = path[depth].weight;
    let mut total = 0.0;
    for j in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next * (depth + 1) as f64 / ((j + 1) as f64 * one);
            total += tmp;
            next = path[j].weight - tmp * zero * (depth - j) as f64 / (depth + 1) as f64;
        } else if zero != 0.0 {
            total += path[j].weight / (zero * (depth - j) as f64 / (depth + 1) as f64);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::BoosterParams;
    use crate::model::Classifier;
    use crate::testing::imbalanced_blobs;
    use approx::assert_relative_eq;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_single_split_attribution() {
        // margin = base + (x0 <= 0.5 ? -1 : 3), covers 3 and 1
        let mut tree = Tree::new();
        let root = tree.push_leaf(0.0, 4.0);
        tree.split_leaf(root, 0, 0.5, (-1.0, 3.0), (3.0, 1.0));
        let mut phi = vec![0.0; 2];
        tree_shap(&tree, ndarray::array![1.0, 7.0].view(), &mut phi);
        // expected value is 0, the only feature on the path takes it all
        assert_relative_eq!(phi[0], 3.0, epsilon = 1e-12);
        assert_eq!(phi[1], 0.0);
    }

    #[test]
    fn test_local_accuracy_on_booster() {
        let (x, y) = imbalanced_blobs(80, 3);
        let mut model = GradientBooster::new(
            "xgb",
            BoosterParams {
                n_estimators: 10,
                max_depth: Some(4),
                ..BoosterParams::xgb_member()
            },
        );
        model.fit(&x, &y).unwrap();
        let explainer = TreeExplainer::new(&model).unwrap();
        let shap = explainer.shap_values(&x, &names(2)).unwrap();
        let margin = model.predict_margin(&x).unwrap();
        for (i, m) in margin.iter().enumerate() {
            let total = shap.expected_value + shap.values.row(i).sum();
            assert_relative_eq!(total, *m, epsilon = 1e-8);
        }
        assert_eq!(shap.ranking().len(), 2);
    }

    #[test]
    fn test_unfitted_model_rejected() {
        let model = GradientBooster::new("xgb", BoosterParams::xgb_member());
        assert!(TreeExplainer::new(&model).is_err());
    }
}
