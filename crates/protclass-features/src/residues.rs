//! CA-atom residue tables from coordinate files.
use crate::{ExtractError, Result};
use itertools::Itertools;
use protclass_io::{Cell, Column, Table};
use std::path::{Path, PathBuf};

/// One CA atom.
#[derive(Debug, Clone, PartialEq)]
pub struct CaAtom {
    pub atom_serial: usize,
    pub residue_name: String,
    pub residue_number: isize,
    pub chain: String,
    pub pos: (f64, f64, f64),
}

/// CA atoms of one structure file together with its provenance.
#[derive(Debug, Clone)]
pub struct ResidueInfo {
    pub protein_name: String,
    pub source_file: String,
    pub atoms: Vec<CaAtom>,
}

impl ResidueInfo {
    /// Read the non-hetero CA atoms of a PDB or mmCIF file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();
        let (pdb, warnings) =
            pdbtbx::open(&*path_str).map_err(|errors| ExtractError::Structure {
                path: path_str.to_string(),
                message: errors.iter().map(|e| e.to_string()).join("; "),
            })?;
        for warning in &warnings {
            log::debug!("{}: {}", path.display(), warning);
        }

        let atoms: Vec<CaAtom> = pdb
            .chains()
            .flat_map(|chain| {
                let chain_id = chain.id().to_string();
                chain.residues().flat_map(move |residue| {
                    let chain_id = chain_id.clone();
                    let res_name = residue.name().unwrap_or_default().to_string();
                    let res_number = residue.serial_number();
                    residue
                        .atoms()
                        .filter(|atom| atom.name() == "CA" && !atom.hetero())
                        .map(move |atom| CaAtom {
                            atom_serial: atom.serial_number(),
                            residue_name: res_name.clone(),
                            residue_number: res_number,
                            chain: chain_id.clone(),
                            pos: atom.pos(),
                        })
                })
            })
            .collect();
        if atoms.is_empty() {
            return Err(ExtractError::NoCaAtoms(path_str.to_string()));
        }

        Ok(ResidueInfo {
            protein_name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_file: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            atoms,
        })
    }

    /// Distinct chain ids, sorted.
    pub fn chains(&self) -> Vec<&str> {
        self.atoms
            .iter()
            .map(|a| a.chain.as_str())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn residue_table(&self) -> Result<Table> {
        let atoms = &self.atoms;
        Ok(Table::from_columns(vec![
            Column::from_numbers("Atom_Serial", atoms.iter().map(|a| a.atom_serial as f64)),
            Column::new(
                "Residue_Name",
                atoms.iter().map(|a| Cell::text(&a.residue_name)).collect(),
            ),
            Column::from_numbers(
                "Residue_Number",
                atoms.iter().map(|a| a.residue_number as f64),
            ),
            Column::new("Chain_Name", atoms.iter().map(|a| Cell::text(&a.chain)).collect()),
            Column::from_numbers("X_Coordinate", atoms.iter().map(|a| a.pos.0)),
            Column::from_numbers("Y_Coordinate", atoms.iter().map(|a| a.pos.1)),
            Column::from_numbers("Z_Coordinate", atoms.iter().map(|a| a.pos.2)),
        ])?)
    }

    pub fn statistics_table(&self) -> Result<Table> {
        Ok(Table::from_columns(vec![
            Column::new(
                "Statistics",
                ["Total_Residues", "Chain_Count", "Protein_Name", "Source_File"]
                    .into_iter()
                    .map(Cell::from)
                    .collect(),
            ),
            Column::new(
                "Value",
                vec![
                    Cell::Number(self.atoms.len() as f64),
                    Cell::Number(self.chains().len() as f64),
                    Cell::text(&self.protein_name),
                    Cell::text(&self.source_file),
                ],
            ),
        ])?)
    }

    pub fn chain_statistics_table(&self) -> Result<Table> {
        let counts = self.atoms.iter().map(|a| a.chain.as_str()).counts();
        let chains = self.chains();
        Ok(Table::from_columns(vec![
            Column::new("Chain_Name", chains.iter().map(|&c| Cell::from(c)).collect()),
            Column::from_numbers("Residue_Count", chains.iter().map(|c| counts[c] as f64)),
        ])?)
    }

    /// Write `<protein>_protein_info.xlsx` into `out_dir`.
    pub fn write_workbook(&self, out_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = out_dir
            .as_ref()
            .join(format!("{}_protein_info.xlsx", self.protein_name));
        let residues = self.residue_table()?;
        let stats = self.statistics_table()?;
        let chains = self.chain_statistics_table()?;
        protclass_io::write_workbook(
            &path,
            &[
                ("Protein_Residue_Info", &residues),
                ("Statistics", &stats),
                ("Chain_Statistics", &chains),
            ],
        )?;
        Ok(path)
    }
}

/// `*.pdb` / `*.PDB` files directly inside `dir`, sorted by name.
pub fn find_pdb_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext == "pdb" || ext == "PDB")
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protclass_test_data::TestFile;

    #[test]
    fn test_ca_atoms_and_tables() {
        let (path, _handle) = TestFile::structure_01().create_temp().unwrap();
        let info = ResidueInfo::from_file(&path).unwrap();
        assert_eq!(info.atoms.len(), 10);
        assert_eq!(info.chains(), vec!["A", "B"]);
        assert_eq!(info.atoms[0].residue_name, "MET");
        assert_eq!(info.atoms[0].atom_serial, 2);
        assert_eq!(info.atoms[6].chain, "B");
        assert_eq!(info.atoms[6].residue_number, 1);

        let stats = info.statistics_table().unwrap();
        assert_eq!(stats.column("Value").unwrap().cells()[0], Cell::Number(10.0));
        assert_eq!(stats.column("Value").unwrap().cells()[1], Cell::Number(2.0));

        let chains = info.chain_statistics_table().unwrap();
        assert_eq!(
            chains.column("Residue_Count").unwrap().cells(),
            &[Cell::Number(6.0), Cell::Number(4.0)]
        );
    }

    #[test]
    fn test_workbook_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let pdb = TestFile::structure_01()
            .copy_to(dir.path(), "1WQW_A.pdb")
            .unwrap();
        let info = ResidueInfo::from_file(&pdb).unwrap();
        assert_eq!(info.protein_name, "1WQW_A");
        let out = info.write_workbook(dir.path()).unwrap();
        assert!(out.ends_with("1WQW_A_protein_info.xlsx"));
        let first = protclass_io::read_table(&out).unwrap();
        assert_eq!(first.n_rows(), 10);
        assert_eq!(find_pdb_files(dir.path()).unwrap(), vec![pdb]);
    }
}
