use anyhow::Context;
use protclass_features::spatial::{add_spatial_features, DEFAULT_FEATURES};
use std::path::PathBuf;

pub fn execute(
    input: PathBuf,
    output: PathBuf,
    columns: Vec<String>,
    neighbours: usize,
) -> anyhow::Result<()> {
    let table = protclass_io::read_table(&input)
        .with_context(|| format!("could not read {}", input.display()))?;
    let features: Vec<&str> = if columns.is_empty() {
        DEFAULT_FEATURES.to_vec()
    } else {
        columns.iter().map(String::as_str).collect()
    };
    let out = add_spatial_features(&table, &features, neighbours)?;
    protclass_io::write_table(&output, &out)
        .with_context(|| format!("could not write {}", output.display()))?;
    log::info!(
        "wrote {} spatial columns for {} residues to {}",
        out.n_cols() - table.n_cols(),
        out.n_rows(),
        output.display()
    );
    Ok(())
}
