use super::{ensure_dir, stem};
use anyhow::Context;
use protclass_features::pssm::{group_pssm_files, read_fasta};
use protclass_features::{PsiBlast, PssmMatrix};
use std::path::{Path, PathBuf};

/// Search every sequence of every FASTA file in `input`.
pub fn execute(input: PathBuf, output: PathBuf, blast: PsiBlast) -> anyhow::Result<()> {
    ensure_dir(&output)?;
    let mut fasta_files: Vec<PathBuf> = std::fs::read_dir(&input)
        .with_context(|| format!("could not read query directory {}", input.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext == "fasta" || ext == "fa" || ext == "faa")
        })
        .collect();
    fasta_files.sort();

    for fasta in &fasta_files {
        let text = match std::fs::read_to_string(fasta) {
            Ok(text) => text,
            Err(err) => {
                log::error!("{}: {err}", fasta.display());
                continue;
            }
        };
        for (id, sequence) in read_fasta(&text) {
            log::info!("running {} for {id} ({} residues)", blast.program, sequence.len());
            let result = blast
                .run(&id, &sequence, &output)
                .and_then(PssmMatrix::read)
                .and_then(|pssm| pssm.to_table());
            match result {
                Ok(table) => {
                    let path = output.join(format!("{id}.xlsx"));
                    match protclass_io::write_table(&path, &table) {
                        Ok(()) => log::info!("{id}: {} positions -> {}", table.n_rows(), path.display()),
                        Err(err) => log::error!("{id}: {err}"),
                    }
                }
                Err(err) => log::error!("{id}: {err}"),
            }
        }
    }
    Ok(())
}

/// Merge existing `.pssm` files sharing a name prefix into one workbook each.
pub fn convert(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    ensure_dir(&output)?;
    let groups = group_pssm_files(&input)
        .with_context(|| format!("could not read {}", input.display()))?;
    for (prefix, files) in groups {
        let mut parts = Vec::with_capacity(files.len());
        for file in &files {
            match PssmMatrix::read(file) {
                Ok(pssm) => parts.push(pssm),
                Err(err) => log::error!("{}: {err}", file.display()),
            }
        }
        let Some(merged) = PssmMatrix::concat(parts) else {
            continue;
        };
        let name = prefix.trim_end_matches('_');
        let path = output.join(format!("{name}.xlsx"));
        match write_merged(&merged, &path) {
            Ok(rows) => log::info!(
                "{name}: merged {} files, {rows} positions -> {}",
                files.len(),
                path.display()
            ),
            Err(err) => log::error!("{}: {err}", stem(&path)),
        }
    }
    Ok(())
}

fn write_merged(merged: &PssmMatrix, path: &Path) -> anyhow::Result<usize> {
    let table = merged.to_table()?;
    protclass_io::write_table(path, &table)?;
    Ok(table.n_rows())
}
