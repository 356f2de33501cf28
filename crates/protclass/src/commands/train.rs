use protclass::{run_training, PipelineConfig};

pub fn execute(config: &PipelineConfig) -> anyhow::Result<()> {
    log::info!("Starting model training...");
    if let Some(summary) = run_training(config) {
        log::info!(
            "Training finished: CV MCC {:.4}, independent MCC {:.4}, {} features",
            summary.cv_mcc_mean,
            summary.independent.mcc,
            summary.selected_features.len()
        );
    }
    Ok(())
}
