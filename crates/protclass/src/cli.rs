use super::commands;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Residue classification pipeline",
    long_about = None,
    after_help = "Examples:\n  protclass --mode train\n  protclass --mode predict --input ./Input_data/1WQW_A_feature.csv\n  protclass --mode predict --input ./Input_data/1WQW_A_feature.csv --output ./results/predictions.xlsx"
)]
pub struct Cli {
    /// 'train' fits and saves a model, 'predict' scores a table with one
    #[arg(long, value_enum)]
    mode: Mode,

    /// Table to score (CSV or Excel)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where to write predictions; defaults to `<input>_predictions.xlsx`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Trained model [default: models/trained_model.pkl]
    #[arg(long)]
    model: Option<PathBuf>,

    /// Fitted feature pipeline [default: models/feature_selector.pkl]
    #[arg(long)]
    selector: Option<PathBuf>,

    /// TOML file overriding paths and hyperparameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Train,
    Predict,
}

impl Cli {
    /// Parse `args`, treating a lone non-flag argument as
    /// `--mode predict --input <arg>`.
    pub fn parse_with_legacy<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        if args.len() == 2 && !args[1].to_string_lossy().starts_with('-') {
            let rewritten = [
                args[0].clone(),
                "--mode".into(),
                "predict".into(),
                "--input".into(),
                args[1].clone(),
            ];
            return Cli::parse_from(rewritten);
        }
        Cli::parse_from(args)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let mut config = protclass::PipelineConfig::load(self.config.as_deref())?;
        if let Some(model) = self.model {
            config.paths.model = model;
        }
        if let Some(selector) = self.selector {
            config.paths.selector = selector;
        }
        match self.mode {
            Mode::Train => commands::train::execute(&config),
            Mode::Predict => commands::predict::execute(&config, self.input, self.output),
        }
    }
}
