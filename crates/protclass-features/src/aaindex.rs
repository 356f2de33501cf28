//! Per-residue physicochemical properties from the AAindex1 database.
use crate::amino::AminoAcid;
use crate::{ExtractError, Result};
use protclass_io::{Cell, Column, Table};
use std::collections::BTreeMap;
use std::path::Path;

/// Indices annotated when none are requested.
#[rustfmt::skip]
pub const DEFAULT_INDICES: [&str; 50] = [
    "LEVM780105", "HOPT810101", "KYTJ820101", "MONM990101", "CHOP780215",
    "CHOP780216", "GRAR740102", "JANJ790102", "ARGP820103", "DAYM780201",
    "DESM900102", "HUTJ700101", "KLEP840101", "KRIW790103", "NAKH920106",
    "NAKH920107", "NAKH920108", "RACS770101", "RACS770102", "RACS770103",
    "TAKK010101", "FUKS010101", "FUKS010102", "FUKS010103", "FUKS010105",
    "FUKS010106", "FUKS010107", "FUKS010109", "FUKS010110", "FUKS010111",
    "COSI940101", "ZHOH040101", "ZHOH040102", "KARS160102", "KARS160103",
    "KARS160108", "KARS160114", "KARS160115", "KARS160116", "KARS160117",
    "KARS160118", "KARS160105", "MAXF760106", "PONJ960101", "CHAM820101",
    "GRAR740103", "FASG890101", "GEIM800108", "HOPA770101", "NAGK730103",
];

/// Indices with incomplete value tables; never annotated.
pub const EXCLUDED_INDICES: [&str; 4] = ["AVBF000109", "YANJ020101", "GUYH850103", "ROSM880105"];

/// Column headers for the indices that have a conventional short name.
const COLUMN_LABELS: [(&str, &str); 10] = [
    ("LEVM780105", "Normalized Accessibility (Na)"),
    ("CHOP780215", "Normalized Average Non-bonded Energy per Atom (Nec)"),
    ("HOPT810101", "Normalized Hydrophobicity (Nphb)"),
    ("KYTJ820101", "Hydrophilicity (Hdrpo)"),
    ("CHOP780216", "Normalized Average Polarizability (Hdrpi)"),
    ("GRAR740102", "Propensity (Prop)"),
    ("JANJ790102", "Isoelectric Point (Isoep)"),
    ("FUKS010101", "Relative Molecular Mass (Mass)"),
    ("ZHOH040101", "Entropy Encoding (Enc)"),
    ("ZHOH040102", "Electron-ion Interaction Potential (Eiip)"),
];

pub const RESIDUE_COLUMN: &str = "ResidueInfo";

/// One AAindex1 record.
#[derive(Debug, Clone, PartialEq)]
pub struct AaIndexEntry {
    pub key: String,
    pub description: String,
    /// Values in [`crate::AAINDEX_ORDER`]; `None` where the database
    /// has `NA`.
    pub values: [Option<f64>; 20],
}

impl AaIndexEntry {
    pub fn value(&self, residue: AminoAcid) -> Option<f64> {
        self.values[residue.aaindex_position()]
    }

    /// Header used for this index in annotated tables.
    pub fn column_name(&self) -> String {
        column_label(&self.key)
    }
}

pub fn column_label(key: &str) -> String {
    COLUMN_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| key.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct AaIndex {
    entries: BTreeMap<String, AaIndexEntry>,
}

impl AaIndex {
    /// Parse the flat-file format: `H` key, `D` description, `I` followed
    /// by the twenty values, `//` ending the record. Records with a value
    /// count other than twenty are skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut key: Option<String> = None;
        let mut description = String::new();
        let mut values: Option<Vec<Option<f64>>> = None;

        for line in text.lines() {
            if line.starts_with("//") {
                if let (Some(k), Some(v)) = (key.take(), values.take()) {
                    match <[Option<f64>; 20]>::try_from(v) {
                        Ok(values) => {
                            entries.insert(
                                k.clone(),
                                AaIndexEntry {
                                    key: k,
                                    description: std::mem::take(&mut description),
                                    values,
                                },
                            );
                        }
                        Err(v) => log::warn!("skipping {k}: expected 20 values, found {}", v.len()),
                    }
                }
                description.clear();
                continue;
            }
            if let Some(v) = values.as_mut() {
                v.extend(line.split_whitespace().map(|t| t.parse::<f64>().ok()));
                continue;
            }
            if let Some(rest) = line.strip_prefix("H ") {
                key = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("D ") {
                description = rest.trim().to_string();
            } else if line.starts_with("I ") {
                values = Some(Vec::with_capacity(20));
            }
        }
        AaIndex { entries }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(AaIndex::parse(&text))
    }

    pub fn get(&self, key: &str) -> Option<&AaIndexEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Append one column per requested index to a residue table.
    ///
    /// Rows without a residue name are dropped. Residues outside the twenty
    /// standard amino acids get empty cells. Excluded and unknown indices are
    /// logged and skipped.
    pub fn annotate(&self, table: &Table, keys: &[&str]) -> Result<Table> {
        let residues = table
            .column(RESIDUE_COLUMN)
            .ok_or_else(|| ExtractError::MissingColumn(RESIDUE_COLUMN.into()))?
            .cells()
            .to_vec();
        let mut out = table.filter_rows(|i| !residues[i].to_string().trim().is_empty());
        let amino: Vec<Option<AminoAcid>> = residues
            .iter()
            .filter(|c| !c.to_string().trim().is_empty())
            .map(|c| AminoAcid::from_code3(&c.to_string()))
            .collect();

        for &key in keys {
            if EXCLUDED_INDICES.contains(&key) {
                log::info!("skipping excluded index {key}");
                continue;
            }
            let Some(entry) = self.get(key) else {
                log::warn!("index {key} not found in AAindex, skipping");
                continue;
            };
            let cells: Vec<Cell> = amino
                .iter()
                .map(|aa| Cell::from(aa.and_then(|aa| entry.value(aa))))
                .collect();
            out.set_column(Column::new(entry.column_name(), cells))?;
        }
        Ok(out)
    }

    /// Like [`AaIndex::annotate`] but a missing index is an error.
    pub fn annotate_strict(&self, table: &Table, keys: &[&str]) -> Result<Table> {
        if let Some(missing) = keys
            .iter()
            .copied()
            .find(|k| !EXCLUDED_INDICES.contains(k) && self.get(k).is_none())
        {
            return Err(ExtractError::UnknownIndex(missing.to_string()));
        }
        self.annotate(table, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protclass_test_data::TestFile;

    fn database() -> AaIndex {
        AaIndex::parse(std::str::from_utf8(TestFile::aaindex_01().bytes()).unwrap())
    }

    #[test]
    fn test_parse_records() {
        let db = database();
        assert_eq!(db.len(), 3);
        let kd = db.get("KYTJ820101").unwrap();
        assert_eq!(kd.description, "Hydropathy index (Kyte-Doolittle, 1982)");
        assert_eq!(kd.value(AminoAcid::ALA), Some(1.8));
        assert_eq!(kd.value(AminoAcid::GLN), Some(-3.5));
        assert_eq!(kd.value(AminoAcid::LYS), Some(-3.9));
        assert_eq!(kd.value(AminoAcid::VAL), Some(4.2));
        let avbf = db.get("AVBF000109").unwrap();
        assert_eq!(avbf.value(AminoAcid::ARG), None);
    }

    #[test]
    fn test_short_record_is_skipped() {
        let text = "H BAD000001\nD short\nI    A/L\n 1.0 2.0\n//\n";
        assert!(AaIndex::parse(text).is_empty());
    }

    #[test]
    fn test_annotate_maps_residues() {
        let db = database();
        let table = Table::from_columns(vec![
            Column::new(
                RESIDUE_COLUMN,
                vec![
                    Cell::text("LYS"),
                    Cell::Empty,
                    Cell::text("HOH"),
                    Cell::text("ala"),
                ],
            ),
            Column::from_numbers("Residue Number", [1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap();
        let out = db
            .annotate(&table, &["KYTJ820101", "AVBF000109", "NOPE000000"])
            .unwrap();
        assert_eq!(out.n_rows(), 3);
        assert_eq!(
            out.column_names(),
            vec![RESIDUE_COLUMN, "Residue Number", "Hydrophilicity (Hdrpo)"]
        );
        assert_eq!(
            out.column("Hydrophilicity (Hdrpo)").unwrap().cells(),
            &[Cell::Number(-3.9), Cell::Empty, Cell::Number(1.8)]
        );
        assert!(matches!(
            db.annotate_strict(&table, &["NOPE000000"]),
            Err(ExtractError::UnknownIndex(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(column_label("HOPT810101"), "Normalized Hydrophobicity (Nphb)");
        assert_eq!(column_label("MONM990101"), "MONM990101");
    }
}
