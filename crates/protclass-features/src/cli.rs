use super::commands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Per-residue feature extraction", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// CA-atom residue workbook for a structure file or a directory of them
    Residues {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run DSSP on every structure of a directory and tabulate the results
    Dssp {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "dssp")]
        program: String,
        /// Tabulate existing `.dssp` files of the input directory
        #[arg(long)]
        parse_only: bool,
    },
    /// PSI-BLAST profiles for every FASTA file of a directory
    Pssm {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// BLAST database searched against
        #[arg(long, required_unless_present = "convert_only")]
        db: Option<PathBuf>,
        #[arg(long, default_value = "psiblast")]
        program: String,
        #[arg(long, default_value_t = 3)]
        num_iterations: u32,
        #[arg(long, default_value_t = 40)]
        num_threads: u32,
        /// Merge existing `.pssm` files of the input directory
        #[arg(long)]
        convert_only: bool,
    },
    /// Residues lining the cavities found under each protein directory
    Pockets {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Append AAindex1 properties to a residue table
    Aaindex {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// AAindex1 flat file
        #[arg(long)]
        database: PathBuf,
        /// Index keys; defaults to the standard set of fifty
        #[arg(long, value_delimiter = ',')]
        indices: Vec<String>,
    },
    /// Average residue features over their nearest spatial neighbours
    Spatial {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(short, long, default_value_t = 7)]
        neighbours: usize,
    },
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Residues { input, output } => commands::residues::execute(input, output),
            Commands::Dssp {
                input,
                output,
                program,
                parse_only,
            } => commands::dssp::execute(input, output, program, parse_only),
            Commands::Pssm {
                input,
                output,
                db,
                program,
                num_iterations,
                num_threads,
                convert_only,
            } => {
                if convert_only {
                    commands::pssm::convert(input, output)
                } else {
                    let mut blast = protclass_features::PsiBlast::new(db.unwrap_or_default());
                    blast.program = program;
                    blast.num_iterations = num_iterations;
                    blast.num_threads = num_threads;
                    commands::pssm::execute(input, output, blast)
                }
            }
            Commands::Pockets { input, output } => commands::pockets::execute(input, output),
            Commands::Aaindex {
                input,
                output,
                database,
                indices,
            } => commands::aaindex::execute(input, output, database, indices),
            Commands::Spatial {
                input,
                output,
                columns,
                neighbours,
            } => commands::spatial::execute(input, output, columns, neighbours),
        }
    }
}
