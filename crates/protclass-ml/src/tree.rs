//! Binary decision trees shared by the boosters and the forest.
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    /// Training weight that reached this node (hessian sum for boosters,
    /// bootstrap weight for forest trees).
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

/// Flat node arena; node 0 is the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn push_leaf(&mut self, value: f64, cover: f64) -> usize {
        self.nodes.push(Node::Leaf { value, cover });
        self.nodes.len() - 1
    }

    /// Turn leaf `node` into a split over two new leaves, returning their ids.
    pub(crate) fn split_leaf(
        &mut self,
        node: usize,
        feature: usize,
        threshold: f64,
        left: (f64, f64),
        right: (f64, f64),
    ) -> (usize, usize) {
        let cover = self.nodes[node].cover();
        let l = self.push_leaf(left.0, left.1);
        let r = self.push_leaf(right.0, right.1);
        self.nodes[node] = Node::Split {
            feature,
            threshold,
            left: l,
            right: r,
            cover,
        };
        (l, r)
    }

    pub(crate) fn set_leaf_value(&mut self, node: usize, new_value: f64) {
        if let Node::Leaf { value, .. } = &mut self.nodes[node] {
            *value = new_value;
        }
    }

    pub fn leaf_index(&self, row: ArrayView1<f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        match &self.nodes[self.leaf_index(row)] {
            Node::Leaf { value, .. } => *value,
            Node::Split { .. } => unreachable!("leaf_index always stops at a leaf"),
        }
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn max_depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Cover-weighted mean of the leaf values.
    pub fn expected_value(&self) -> f64 {
        let Some(root) = self.nodes.first() else {
            return 0.0;
        };
        let total = root.cover();
        if total <= 0.0 {
            return 0.0;
        }
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Leaf { value, cover } => Some(value * cover),
                Node::Split { .. } => None,
            })
            .sum::<f64>()
            / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump() -> Tree {
        let mut t = Tree::new();
        let root = t.push_leaf(0.0, 4.0);
        let (l, _) = t.split_leaf(root, 1, 0.5, (-1.0, 3.0), (2.0, 1.0));
        t.split_leaf(l, 0, 10.0, (-2.0, 2.0), (0.0, 1.0));
        t
    }

    #[test]
    fn test_routing() {
        let t = stump();
        assert_eq!(t.predict_row(array![0.0, 0.5].view()), -2.0);
        assert_eq!(t.predict_row(array![11.0, 0.0].view()), 0.0);
        assert_eq!(t.predict_row(array![0.0, 0.6].view()), 2.0);
        assert_eq!(t.max_depth(), 2);
        assert_eq!(t.n_leaves(), 3);
    }

    #[test]
    fn test_expected_value_weights_by_cover() {
        // (-2*2 + 0*1 + 2*1) / 4
        assert_eq!(stump().expected_value(), -0.5);
    }
}
