use anyhow::{Context, Result};
use clap::Parser;
use stackref_translate::{translate_tree, RewriteOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rewrite StackReference consumers into mjus Remote / Offer programs.
#[derive(Debug, Parser)]
#[command(name = "stackref-translate", version)]
struct Cli {
    /// Directory to translate recursively
    #[arg(default_value = "repos")]
    root: PathBuf,

    /// JSON file overriding module names, aliases and config keys
    #[arg(long)]
    options: Option<PathBuf>,

    /// Print the run report as JSON instead of advisory lines
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let options = match &cli.options {
        Some(path) => RewriteOptions::from_file(path)?,
        None => RewriteOptions::default(),
    };

    let report = translate_tree(&cli.root, &options)
        .with_context(|| format!("translating {}", cli.root.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for advisory in &report.advisories {
            println!("{}", advisory);
        }
        for failure in &report.failures {
            eprintln!("{}: {}", failure.path, failure.message);
        }
    }

    Ok(())
}
