use super::ensure_dir;
use protclass_features::pockets::{collect_pockets, find_cavity_dirs, pockets_table};
use std::path::PathBuf;

pub fn execute(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    ensure_dir(&output)?;
    let dirs = find_cavity_dirs(&input)?;
    if dirs.is_empty() {
        log::warn!("no cavity files found under {}", input.display());
    }
    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = collect_pockets(&dir).and_then(|residues| pockets_table(&residues));
        match result {
            Ok(table) => {
                let path = output.join(format!("{name}.xlsx"));
                match protclass_io::write_table(&path, &table) {
                    Ok(()) => log::info!("{name}: {} pocket residues", table.n_rows()),
                    Err(err) => log::error!("{name}: {err}"),
                }
            }
            Err(err) => log::error!("{name}: {err}"),
        }
    }
    Ok(())
}
