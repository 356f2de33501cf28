//! PSI-BLAST position-specific scoring matrices.
use crate::{ExtractError, Result};
use protclass_io::{Cell, Column, Table};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Trailing lines after the matrix (K/Lambda statistics).
const FOOTER_LINES: usize = 5;
/// Files sharing this many leading characters are merged into one table.
const GROUP_PREFIX_LEN: usize = 16;

/// Whitespace-split matrix rows under the header found on the third line.
#[derive(Debug, Clone, PartialEq)]
pub struct PssmMatrix {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PssmMatrix {
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let Some(header_line) = lines.get(2) else {
            return Err(ExtractError::Malformed {
                file: "PSSM".into(),
                reason: format!("expected a header on line 3, found {} lines", lines.len()),
            });
        };
        let mut headers: Vec<String> = header_line.split_whitespace().map(String::from).collect();
        let end = lines.len().saturating_sub(FOOTER_LINES);
        let mut rows: Vec<Vec<String>> = lines
            .get(3..end)
            .unwrap_or_default()
            .iter()
            .map(|l| l.split_whitespace().map(String::from).collect())
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(headers.len());
        for row in rows.iter_mut() {
            row.resize(width, String::new());
        }
        let n_headers = headers.len();
        headers.extend((n_headers..width).map(|i| format!("Extra_col_{i}")));
        rows.retain(|row| row.iter().any(|c| !c.trim().is_empty()));
        Ok(PssmMatrix { headers, rows })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        PssmMatrix::parse(&text).map_err(|err| match err {
            ExtractError::Malformed { reason, .. } => ExtractError::Malformed {
                file: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Stack several matrices under the headers of the first one.
    pub fn concat(parts: Vec<PssmMatrix>) -> Option<PssmMatrix> {
        let mut parts = parts.into_iter();
        let mut merged = parts.next()?;
        for part in parts {
            merged.rows.extend(part.rows);
        }
        let width = merged.headers.len();
        for row in merged.rows.iter_mut() {
            row.resize(width, String::new());
        }
        Some(merged)
    }

    /// The first two columns become `seq` (renumbered from 1) and
    /// `residues_id`. Repeated header names get a `.1`, `.2`, ... suffix.
    pub fn to_table(&self) -> Result<Table> {
        let mut names = self.headers.clone();
        if let Some(first) = names.get_mut(0) {
            *first = "seq".into();
        }
        if let Some(second) = names.get_mut(1) {
            *second = "residues_id".into();
        }
        let names = dedup_names(names);

        let mut table = Table::new();
        for (idx, name) in names.into_iter().enumerate() {
            let cells: Vec<Cell> = if idx == 0 {
                (1..=self.rows.len()).map(|i| Cell::Number(i as f64)).collect()
            } else {
                self.rows.iter().map(|row| Cell::parse(&row[idx])).collect()
            };
            table.push_column(Column::new(name, cells))?;
        }
        Ok(table)
    }
}

fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            out
        })
        .collect()
}

/// `(id, sequence)` records of a FASTA file. The id is the first token after
/// `>`.
pub fn read_fasta(text: &str) -> Vec<(String, String)> {
    let mut records = Vec::new();
    let mut current: Option<(String, String)> = None;
    for line in text.lines() {
        if let Some(header) = line.strip_prefix('>') {
            records.extend(current.take());
            let id = header.split_whitespace().next().unwrap_or_default();
            current = Some((id.to_string(), String::new()));
        } else if let Some((_, seq)) = current.as_mut() {
            seq.push_str(line.trim());
        }
    }
    records.extend(current);
    records
}

/// `.pssm` files of `dir` grouped by their leading characters; within a
/// group, files containing `_1_` come first.
pub fn group_pssm_files(dir: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !name.ends_with(".pssm") {
            continue;
        }
        let prefix: String = name.chars().take(GROUP_PREFIX_LEN).collect();
        groups.entry(prefix).or_default().push(path);
    }
    for files in groups.values_mut() {
        files.sort_by_key(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned());
            (!name.is_some_and(|n| n.contains("_1_")), p.clone())
        });
    }
    Ok(groups)
}

/// A PSI-BLAST invocation against one database.
#[derive(Debug, Clone)]
pub struct PsiBlast {
    pub program: String,
    pub database: PathBuf,
    pub num_iterations: u32,
    pub num_threads: u32,
}

impl PsiBlast {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        PsiBlast {
            program: "psiblast".into(),
            database: database.into(),
            num_iterations: 3,
            num_threads: 40,
        }
    }

    /// Search with one sequence and return the ASCII PSSM path
    /// (`<out_dir>/<id>.pssm`).
    pub fn run(&self, id: &str, sequence: &str, out_dir: &Path) -> Result<PathBuf> {
        let query = out_dir.join(format!("{id}_temp.fasta"));
        std::fs::write(&query, format!(">{id}\n{sequence}\n"))?;
        let pssm = out_dir.join(format!("{id}.pssm"));

        let output = Command::new(&self.program)
            .arg("-query")
            .arg(&query)
            .arg("-db")
            .arg(&self.database)
            .arg("-num_iterations")
            .arg(self.num_iterations.to_string())
            .arg("-out_ascii_pssm")
            .arg(&pssm)
            .arg("-out_pssm")
            .arg(out_dir.join(format!("{id}.chk")))
            .arg("-out")
            .arg(out_dir.join(format!("{id}_results.out")))
            .arg("-num_threads")
            .arg(self.num_threads.to_string())
            .output();
        if let Err(err) = std::fs::remove_file(&query) {
            log::warn!("could not remove {}: {err}", query.display());
        }
        let output = output.map_err(|source| ExtractError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ExtractError::Subprocess {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(pssm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protclass_test_data::TestFile;

    #[test]
    fn test_parse_fixture() {
        let (path, _handle) = TestFile::pssm_01().create_temp().unwrap();
        let pssm = PssmMatrix::read(&path).unwrap();
        assert_eq!(pssm.rows.len(), 6);
        // 40 header tokens, 44 per row: position, residue, 20 scores,
        // 20 percentages, information, weight
        assert_eq!(pssm.headers.len(), 44);
        assert_eq!(pssm.headers[40], "Extra_col_40");

        let table = pssm.to_table().unwrap();
        let names = table.column_names();
        assert_eq!(&names[..3], &["seq", "residues_id", "N"]);
        // the percentage block repeats the score letters
        assert_eq!(names[20], "A");
        assert_eq!(names[22], "N.1");
        assert_eq!(names[43], "Extra_col_43");
        assert_eq!(table.column("residues_id").unwrap().cells()[1], Cell::text("K"));
        assert_eq!(table.column("N").unwrap().cells()[0], Cell::Number(5.0));
        assert_eq!(table.column("seq").unwrap().cells()[5], Cell::Number(6.0));
    }

    #[test]
    fn test_padding_and_empty_rows() {
        let text = "\nheader\n a b c\n1 M 3\n\n2 K 4 9\nf1\nf2\nf3\nf4\nf5\n";
        let pssm = PssmMatrix::parse(text).unwrap();
        assert_eq!(pssm.headers, vec!["a", "b", "c", "Extra_col_3"]);
        assert_eq!(pssm.rows.len(), 2);
        assert_eq!(pssm.rows[0], vec!["1", "M", "3", ""]);
        let table = pssm.to_table().unwrap();
        assert!(table.column("Extra_col_3").unwrap().cells()[0].is_empty());
    }

    #[test]
    fn test_concat_keeps_first_headers() {
        let a = PssmMatrix::parse("\n\nx y\n1 M\nf\nf\nf\nf\nf\n").unwrap();
        let b = PssmMatrix::parse("\n\nx y z\n1 K 2\nf\nf\nf\nf\nf\n").unwrap();
        let merged = PssmMatrix::concat(vec![a, b]).unwrap();
        assert_eq!(merged.headers, vec!["x", "y"]);
        assert_eq!(merged.rows, vec![vec!["1", "M"], vec!["1", "K"]]);
        assert!(PssmMatrix::concat(Vec::new()).is_none());
    }

    #[test]
    fn test_read_fasta() {
        let records = read_fasta(">1WQW_A desc\nMKA\nLSE\n>2ABC\nGG\n");
        assert_eq!(
            records,
            vec![
                ("1WQW_A".to_string(), "MKALSE".to_string()),
                ("2ABC".to_string(), "GG".to_string())
            ]
        );
    }

    #[test]
    fn test_grouping_puts_first_segment_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["PROT_0000000001_2_.pssm", "PROT_0000000001_1_.pssm", "other.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let groups = group_pssm_files(dir.path()).unwrap();
        assert_eq!(groups.len(), 1);
        let files = &groups["PROT_0000000001_"];
        assert!(files[0].to_string_lossy().contains("_1_"));
        assert_eq!(files.len(), 2);
    }
}
