use super::{ensure_dir, stem};
use protclass_features::dssp::{read_dssp, run_dssp};
use protclass_features::find_pdb_files;
use std::path::{Path, PathBuf};

pub fn execute(
    input: PathBuf,
    output: PathBuf,
    program: String,
    parse_only: bool,
) -> anyhow::Result<()> {
    ensure_dir(&output)?;
    let dssp_files: Vec<PathBuf> = if parse_only {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&input)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "dssp"))
            .collect();
        files.sort();
        files
    } else {
        let mut produced = Vec::new();
        for pdb in find_pdb_files(&input)? {
            let out = output.join(format!("{}.dssp", stem(&pdb)));
            match run_dssp(&program, &pdb, &out) {
                Ok(()) => produced.push(out),
                Err(err) => log::error!("{}: {err}", pdb.display()),
            }
        }
        produced
    };

    for file in &dssp_files {
        if let Err(err) = tabulate(file, &output) {
            log::error!("{}: {err}", file.display());
        }
    }
    Ok(())
}

fn tabulate(file: &Path, output: &Path) -> anyhow::Result<()> {
    let table = read_dssp(file)?;
    let path = output.join(format!("{}.xlsx", stem(file)));
    protclass_io::write_table(&path, &table)?;
    log::info!("{}: {} residues -> {}", stem(file), table.n_rows(), path.display());
    Ok(())
}
