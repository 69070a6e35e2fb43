//! Command-line front end
//!
//! Loads one YAML file through the `!include`/`!exclude` pipeline and
//! prints the constructed value, re-serialized as YAML, to standard output.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yaml_splice::{Loader, LoaderOptions};

#[derive(Parser, Debug)]
#[command(name = "yaml-splice")]
#[command(about = "Load a YAML file with !include/!exclude processing", long_about = None)]
#[command(version)]
struct Cli {
    /// YAML file to load
    file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let loader = Loader::new(LoaderOptions::default())?;
    let value = loader.load_file(&cli.file)?;

    print!("{}", serde_yaml::to_string(&value)?);
    Ok(())
}
