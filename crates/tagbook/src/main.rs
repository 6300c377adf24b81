//! `tagbook` command-line entry point.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::{LevelFilter, error, warn};
use tagbook::logging::init_logging;
use tagbook::{SpecBuildOptions, TagbookError, run_build, run_catalog, run_normalize};

#[derive(Parser)]
#[command(name = "tagbook")]
#[command(about = "Serialize tagged table catalogs into workbooks", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every workbook from the config catalog
    Build {
        #[command(flatten)]
        common: CommonArgs,

        /// Root that DataLocation paths are relative to
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Workbook output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also write the catalog export to this file
        #[arg(long)]
        catalog_out: Option<PathBuf>,

        /// Maximum parallel document writers
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Write normalized config documents and the catalog export
    Normalize {
        #[command(flatten)]
        common: CommonArgs,

        /// Output directory for normalized documents
        #[arg(long)]
        output_dir: PathBuf,
    },

    /// Print the catalog export
    Catalog {
        #[command(flatten)]
        common: CommonArgs,

        /// Write the export to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Config root searched for documents
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// TOML settings file (CLI flags override it)
    #[arg(long, short = 's')]
    settings: Option<PathBuf>,
}

impl CommonArgs {
    fn load_options(&self) -> Result<SpecBuildOptions, TagbookError> {
        let mut options = match &self.settings {
            Some(path) => SpecBuildOptions::from_toml_file(path)?,
            None => SpecBuildOptions::default(),
        };
        if let Some(path) = &self.config_dir {
            options.path_dir_config = path.clone();
        }
        Ok(options)
    }
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = init_logging(level) {
        eprintln!("{err}");
    }

    if let Err(err) = run(cli.command) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), TagbookError> {
    match command {
        Commands::Build {
            common,
            data_dir,
            output_dir,
            catalog_out,
            workers,
        } => {
            let mut options = common.load_options()?;
            if let Some(path) = data_dir {
                options.path_dir_data = path;
            }
            if let Some(path) = output_dir {
                options.path_dir_output = path;
            }
            if catalog_out.is_some() {
                options.path_file_catalog_out = catalog_out;
            }
            if workers.is_some() {
                options.num_workers_max = workers;
            }

            let report = run_build(&options)?;
            for warning in &report.warnings {
                warn!("{warning}");
            }
            println!("{report}");
        }
        Commands::Normalize { common, output_dir } => {
            let options = common.load_options()?;
            let report = run_normalize(&options, &output_dir)?;
            for warning in &report.warnings {
                warn!("{warning}");
            }
            println!("{}", report.format("[NORMALIZE]"));
        }
        Commands::Catalog { common, out } => {
            let options = common.load_options()?;
            let c_csv = run_catalog(&options, out.as_deref())?;
            if out.is_none() {
                print!("{c_csv}");
            }
        }
    }
    Ok(())
}
