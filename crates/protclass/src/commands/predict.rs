use protclass::{predict_single_file, PipelineConfig};
use std::path::PathBuf;

pub fn execute(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let Some(input) = input else {
        log::error!("--input is required for predict mode");
        return Ok(());
    };
    if !input.exists() {
        log::error!("Input file does not exist: {}", input.display());
        return Ok(());
    }
    let (model, selector) = (&config.paths.model, &config.paths.selector);
    if !model.is_file() || !selector.is_file() {
        log::error!("Trained model not found. Please train the model first: protclass --mode train");
        return Ok(());
    }
    log::info!("Starting prediction for {}", input.display());
    predict_single_file(model, selector, &input, output.as_deref());
    Ok(())
}
