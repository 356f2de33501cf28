//! protclass-plot
//!
//! SVG renderings of TreeSHAP explanations:
//!
//! - [`summary_bar`]: mean |SHAP| per feature
//! - [`summary_beeswarm`]: every SHAP value, coloured by the feature value
//! - [`waterfall`]: how one prediction moves away from the expected value
//!
//! [`save_shap_plots`] writes all three into a directory.
mod bar;
mod beeswarm;
mod style;
mod waterfall;

use protclass_ml::ShapValues;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use self::bar::summary_bar;
pub use self::beeswarm::summary_beeswarm;
pub use self::waterfall::waterfall;

pub const BAR_FILE: &str = "shap_summary_bar.svg";
pub const BEESWARM_FILE: &str = "shap_summary.svg";
pub const WATERFALL_FILE: &str = "shap_waterfall.svg";

/// Features shown before the rest are folded away.
pub const DEFAULT_MAX_DISPLAY: usize = 20;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no SHAP values to plot")]
    Empty,

    #[error("row {row} out of range for {rows} explained rows")]
    RowOutOfRange { row: usize, rows: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Render the bar, beeswarm and first-row waterfall plots into `out_dir`,
/// creating it if needed. Returns the written paths.
pub fn save_shap_plots(
    shap: &ShapValues,
    out_dir: impl AsRef<Path>,
    max_display: usize,
) -> Result<Vec<PathBuf>, PlotError> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;
    let plots = [
        (BAR_FILE, summary_bar(shap, max_display)?),
        (BEESWARM_FILE, summary_beeswarm(shap, max_display)?),
        (WATERFALL_FILE, waterfall(shap, 0, max_display)?),
    ];
    let mut written = Vec::with_capacity(plots.len());
    for (name, document) in plots {
        let path = out_dir.join(name);
        svg::save(&path, &document)?;
        log::info!("saved {}", path.display());
        written.push(path);
    }
    Ok(written)
}
