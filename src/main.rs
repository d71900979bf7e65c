/// CI base image discovery
use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use thiserror::Error;
use log::{debug, error, info};
use image_discovery::{config, discovery, output};
use image_discovery::discovery::Discoverer;
use image_discovery::output::{Document, DockerfileList, Format};

/// Discover the base images of a repository's CI Dockerfiles.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Root of the source code tree.
    #[arg(default_value = ".")]
    repository_directory: PathBuf,

    /// Path to the discovery configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    output: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print required base images, their aliases, and the inputs of every Dockerfile.
    Images,
    /// Print discovered Dockerfiles and whether they build production or test images.
    Dockerfiles,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration file: {0}")]
    Config(#[from] config::Error),

    #[error("discovery: {0}")]
    Discovery(#[from] discovery::Error),

    #[error("output: {0}")]
    Output(#[from] output::Error),
}

/// Read configuration file from disk, falling back to the built-in config.
///
/// If a configuration file name is not set explicitly, this function will
/// detect whether a config file with the default file name exists in the
/// repository root. If it does, it is used implicitly.
fn read_config(args: &Cli) -> Result<config::File, Error> {
    let config_path = args.repository_directory.join(config::DEFAULT_CONFIG_FILE);

    let config_file = match &args.config {
        None => {
            if is_file(&config_path) {
                Some(config_path)
            } else {
                None
            }
        }
        Some(c) => Some(c.clone()),
    };

    Ok(if let Some(config_file) = config_file {
        debug!("Reading configuration from {}", config_file.display());
        config::File::default_with_user_config_file(&config_file)?
    } else {
        config::File::default()
    })
}

fn is_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn main() {
    match run() {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1)
        }
    }
}

fn run() -> Result<(), Error> {
    env_logger::init();

    let args = Cli::parse();
    let cfg = read_config(&args)?;

    info!("CI image discovery {}", env!("CARGO_PKG_VERSION"));

    let discovery = Discoverer::new(cfg)?.discover(&args.repository_directory)?;
    info!(
        "{} base images required by {} Dockerfiles",
        discovery.images.len(),
        discovery.build_files.len()
    );

    let rendered = match args.command {
        Commands::Images => output::render(&Document::new(&discovery)?, args.output)?,
        Commands::Dockerfiles => output::render(&DockerfileList::new(&discovery), args.output)?,
    };
    print!("{rendered}");
    if args.output == Format::Json {
        println!();
    }

    Ok(())
}
