//! Dense feature matrices and the boolean feature masks selected by Boruta.
use crate::{PipelineError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Row-major sample x feature matrix with one name per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub names: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(values: Array2<f64>, names: Vec<String>) -> Result<Self> {
        if values.ncols() != names.len() {
            return Err(PipelineError::FeatureCountMismatch {
                expected: names.len(),
                found: values.ncols(),
            });
        }
        Ok(FeatureMatrix { values, names })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Keep only the columns the mask selects.
    pub fn select(&self, mask: &FeatureMask) -> Result<FeatureMatrix> {
        Ok(FeatureMatrix {
            values: mask.apply(&self.values)?,
            names: mask.selected_names(&self.names)?,
        })
    }

    /// Rows at `indices`, in that order.
    pub fn rows(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            values: self.values.select(Axis(0), indices),
            names: self.names.clone(),
        }
    }
}

/// One flag per candidate feature; `true` keeps the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMask {
    support: Vec<bool>,
}

impl FeatureMask {
    pub fn new(support: Vec<bool>) -> Self {
        FeatureMask { support }
    }

    pub fn all(n_features: usize) -> Self {
        FeatureMask::new(vec![true; n_features])
    }

    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    pub fn support(&self) -> &[bool] {
        &self.support
    }

    pub fn n_selected(&self) -> usize {
        self.support.iter().filter(|&&s| s).count()
    }

    /// Indices of kept columns, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.support
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    fn check_len(&self, found: usize) -> Result<()> {
        if found != self.support.len() {
            return Err(PipelineError::MaskMismatch {
                expected: self.support.len(),
                found,
            });
        }
        Ok(())
    }

    pub fn apply(&self, values: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_len(values.ncols())?;
        Ok(values.select(Axis(1), &self.indices()))
    }

    pub fn selected_names(&self, names: &[String]) -> Result<Vec<String>> {
        self.check_len(names.len())?;
        Ok(self
            .indices()
            .into_iter()
            .map(|i| names[i].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_select_keeps_order() {
        let m = FeatureMatrix::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], names(3)).unwrap();
        let mask = FeatureMask::new(vec![true, false, true]);
        let s = m.select(&mask).unwrap();
        assert_eq!(s.values, array![[1.0, 3.0], [4.0, 6.0]]);
        assert_eq!(s.names, vec!["f0", "f2"]);
        assert_eq!(mask.n_selected(), 2);
    }

    #[test]
    fn test_mask_length_mismatch() {
        let m = FeatureMatrix::new(array![[1.0, 2.0]], names(2)).unwrap();
        let mask = FeatureMask::all(3);
        assert!(matches!(
            m.select(&mask),
            Err(PipelineError::MaskMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_name_count_checked() {
        assert!(FeatureMatrix::new(array![[1.0, 2.0]], names(3)).is_err());
    }
}
