//! Residues lining predicted cavities.
//!
//! A cavity search leaves one directory per protein holding
//! `this_cavity_1.pdb`, `this_cavity_2.pdb`, ... Each directory becomes one
//! table of the distinct residues named in those files.
use crate::Result;
use protclass_io::{Cell, Column, Table};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CAVITY_FILES: [&str; 2] = ["this_cavity_1.pdb", "this_cavity_2.pdb"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PocketResidue {
    pub protein_id: String,
    pub file_name: String,
    pub residue_name: String,
    pub residue_number: String,
}

/// Residue name and number of every ATOM/HETATM record, read from the fixed
/// PDB columns.
pub fn parse_cavity(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|line| line.starts_with("ATOM") || line.starts_with("HETATM"))
        .map(|line| {
            let name = line.get(17..20).unwrap_or_default().trim().to_string();
            let number = line.get(22..26).unwrap_or_default().trim().to_string();
            (name, number)
        })
        .collect()
}

/// Distinct cavity residues of one protein directory in first-seen order.
pub fn collect_pockets(dir: impl AsRef<Path>) -> Result<Vec<PocketResidue>> {
    let dir = dir.as_ref();
    let protein_id = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut seen = HashSet::new();
    let mut residues = Vec::new();
    for file_name in CAVITY_FILES {
        let path = dir.join(file_name);
        if !path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        for (residue_name, residue_number) in parse_cavity(&text) {
            let residue = PocketResidue {
                protein_id: protein_id.clone(),
                file_name: file_name.to_string(),
                residue_name,
                residue_number,
            };
            if seen.insert(residue.clone()) {
                residues.push(residue);
            }
        }
    }
    Ok(residues)
}

pub fn pockets_table(residues: &[PocketResidue]) -> Result<Table> {
    Ok(Table::from_columns(vec![
        Column::new(
            "ProteinID",
            residues.iter().map(|r| Cell::text(&r.protein_id)).collect(),
        ),
        Column::new(
            "File_Name",
            residues.iter().map(|r| Cell::text(&r.file_name)).collect(),
        ),
        Column::new(
            "Residue_Name",
            residues.iter().map(|r| Cell::text(&r.residue_name)).collect(),
        ),
        Column::new(
            "Residue_Number",
            residues.iter().map(|r| Cell::parse(&r.residue_number)).collect(),
        ),
    ])?)
}

/// Subdirectories of `root` holding at least one cavity file.
pub fn find_cavity_dirs(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && CAVITY_FILES.iter().any(|f| path.join(f).is_file()) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
