use super::ensure_dir;
use anyhow::bail;
use protclass_features::{find_pdb_files, ResidueInfo};
use std::path::PathBuf;

pub fn execute(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let files = if input.is_dir() {
        find_pdb_files(&input)?
    } else if input.is_file() {
        vec![input.clone()]
    } else {
        bail!("input {} does not exist", input.display());
    };
    ensure_dir(&output)?;

    let mut written = 0;
    for file in &files {
        match ResidueInfo::from_file(file).and_then(|info| {
            let path = info.write_workbook(&output)?;
            Ok((info, path))
        }) {
            Ok((info, path)) => {
                log::info!(
                    "{}: {} residues in {} chains -> {}",
                    info.protein_name,
                    info.atoms.len(),
                    info.chains().len(),
                    path.display()
                );
                written += 1;
            }
            Err(err) => log::error!("{}: {err}", file.display()),
        }
    }
    log::info!("processed {written} of {} structure files", files.len());
    Ok(())
}
