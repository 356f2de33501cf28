//! Brute-force Euclidean nearest neighbours.
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

pub struct NearestNeighbors<'a> {
    data: ArrayView2<'a, f64>,
}

impl<'a> NearestNeighbors<'a> {
    pub fn new(data: ArrayView2<'a, f64>) -> Self {
        NearestNeighbors { data }
    }

    /// Indices of the `k` rows closest to `point`, nearest first. Ties keep
    /// the lower row index first. A point that is itself a row of the data is
    /// returned as its own nearest neighbour.
    pub fn query(&self, point: ArrayView1<f64>, k: usize) -> Vec<usize> {
        let mut dist: Vec<(f64, usize)> = self
            .data
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let d = row
                    .iter()
                    .zip(point.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>();
                (d, i)
            })
            .collect();
        let k = k.min(dist.len());
        if k == 0 {
            return Vec::new();
        }
        dist.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dist.truncate(k);
        dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dist.into_iter().map(|(_, i)| i).collect()
    }

    /// [`NearestNeighbors::query`] for every row of `points`, in parallel.
    pub fn query_rows(&self, points: ArrayView2<f64>, k: usize) -> Vec<Vec<usize>> {
        (0..points.nrows())
            .into_par_iter()
            .map(|i| self.query(points.row(i), k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_query_orders_by_distance() {
        let data = array![[0.0, 0.0], [3.0, 0.0], [1.0, 0.0], [1.0, 0.0]];
        let nn = NearestNeighbors::new(data.view());
        assert_eq!(nn.query(array![0.0, 0.0].view(), 3), vec![0, 2, 3]);
        assert_eq!(nn.query(array![2.9, 0.0].view(), 1), vec![1]);
        assert_eq!(nn.query(array![2.9, 0.0].view(), 10).len(), 4);
    }

    #[test]
    fn test_query_rows_includes_self() {
        let data = array![[0.0], [10.0], [11.0]];
        let nn = NearestNeighbors::new(data.view());
        let all = nn.query_rows(data.view(), 2);
        assert_eq!(all, vec![vec![0, 1], vec![1, 2], vec![2, 1]]);
    }
}
