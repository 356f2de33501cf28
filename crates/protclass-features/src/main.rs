use clap::Parser;
mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .init();
    cli.execute()?;
    Ok(())
}
