use anyhow::Context;
use protclass_features::aaindex::DEFAULT_INDICES;
use protclass_features::AaIndex;
use std::path::PathBuf;

pub fn execute(
    input: PathBuf,
    output: PathBuf,
    database: PathBuf,
    indices: Vec<String>,
) -> anyhow::Result<()> {
    let db = AaIndex::read(&database)
        .with_context(|| format!("could not read AAindex file {}", database.display()))?;
    log::info!("loaded {} AAindex entries", db.len());
    let table = protclass_io::read_table(&input)
        .with_context(|| format!("could not read {}", input.display()))?;

    let keys: Vec<&str> = if indices.is_empty() {
        DEFAULT_INDICES.to_vec()
    } else {
        indices.iter().map(String::as_str).collect()
    };
    let annotated = db.annotate(&table, &keys)?;
    protclass_io::write_table(&output, &annotated)
        .with_context(|| format!("could not write {}", output.display()))?;
    log::info!(
        "added {} columns to {} residues -> {}",
        annotated.n_cols() - table.n_cols(),
        annotated.n_rows(),
        output.display()
    );
    Ok(())
}
