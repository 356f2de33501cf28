pub mod aaindex;
pub mod dssp;
pub mod pockets;
pub mod pssm;
pub mod residues;
pub mod spatial;

use anyhow::Context;
use std::path::Path;

/// Create `dir` (and parents) if needed.
fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create output directory {}", dir.display()))
}

/// File name without extension, as used for output names.
fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
