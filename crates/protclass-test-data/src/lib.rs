//! protclass-test-data
//!
//! Fixture files embedded in the crate for use in tests.
//!
//! Each fixture is a [`TestFile`] packaging the raw bytes; `create_temp`
//! materialises it as a temporary file and `copy_to` places it under a chosen
//! name, for code that walks directories.
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use protclass_test_data::TestFile;
/// let (pdb_file, _temp) = TestFile::structure_01().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// Two chains (A: 6 residues, B: 4 residues), backbone N/CA/C atoms only.
    pub fn structure_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/structures/mini.pdb"),
            suffix: "pdb",
        }
    }
    /// DSSP 2.2 output for six residues of chain A, plus one short line.
    pub fn dssp_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/dssp/mini.dssp"),
            suffix: "dssp",
        }
    }
    /// PSI-BLAST ASCII PSSM for the six residue sequence MKALSE.
    pub fn pssm_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/pssm/mini.pssm"),
            suffix: "pssm",
        }
    }
    /// AAindex1 excerpt: KYTJ820101, HOPT810101 and AVBF000109 (with NA values).
    pub fn aaindex_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/aaindex/aaindex1_mini"),
            suffix: "txt",
        }
    }
    /// Cavity residues LYS 2 (twice), ALA 3 and a water.
    pub fn cavity_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/pockets/this_cavity_1.pdb"),
            suffix: "pdb",
        }
    }
    /// Cavity residues LEU 4 and ALA 3.
    pub fn cavity_02() -> Self {
        Self {
            filebinary: include_bytes!("../data/pockets/this_cavity_2.pdb"),
            suffix: "pdb",
        }
    }
    /// Labelled residue table (160 rows, one positive in four).
    pub fn train_table() -> Self {
        Self {
            filebinary: include_bytes!("../data/tables/train.csv"),
            suffix: "csv",
        }
    }
    /// Labelled residue table from a second protein (48 rows).
    pub fn independent_table() -> Self {
        Self {
            filebinary: include_bytes!("../data/tables/independent_test.csv"),
            suffix: "csv",
        }
    }
    /// Three unlabelled residues.
    pub fn predict_table() -> Self {
        Self {
            filebinary: include_bytes!("../data/tables/predict.csv"),
            suffix: "csv",
        }
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }

    /// Write the fixture into `dir` as `file_name`.
    pub fn copy_to(&self, dir: impl AsRef<Path>, file_name: &str) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(file_name);
        fs::write(&path, self.filebinary)?;
        Ok(path)
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.filebinary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_keeps_suffix_and_bytes() {
        let (path, _handle) = TestFile::pssm_01().create_temp().unwrap();
        assert!(path.ends_with(".pssm"));
        assert_eq!(fs::read(&path).unwrap(), TestFile::pssm_01().bytes());
    }

    #[test]
    fn test_copy_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestFile::cavity_01()
            .copy_to(dir.path(), "this_cavity_1.pdb")
            .unwrap();
        assert!(path.exists());
    }
}
