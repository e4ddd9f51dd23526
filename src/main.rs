//! threatplot — renders honeypot/security event logs as an animated
//! Hilbert-curve attack heatmap. Run `threatplot --help` for usage.

use anyhow::Result;
use clap::Parser;
use heatmap_core::{hilbert, CidrMap};
use tracing_subscriber::EnvFilter;

mod cli;
mod color;
mod config;
mod driver;
mod input;
mod log_parser;
mod ppm;
mod signals;
mod video;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let example = config::RunConfig::default_example();
            print!("{}", toml::to_string_pretty(&example)?);
        }
        Commands::CheckCidr { path, hilbert_order } => {
            check_cidr(&path, hilbert_order)?;
        }
        Commands::Render { inputs, output_dir } => {
            if !cli.config.exists() {
                std::fs::write(&cli.config, b"")?;
                eprintln!(
                    "{}",
                    color::yellow(&format!(
                        "Created '{}' with defaults — edit it or run `threatplot init > {}` for a full example.",
                        cli.config.display(),
                        cli.config.display()
                    ))
                );
            }
            let cfg = config::RunConfig::load(&cli.config)?;
            driver::run(&cfg, &inputs, output_dir.as_deref())?;
        }
    }

    Ok(())
}

fn check_cidr(path: &std::path::Path, hilbert_order: u8) -> Result<()> {
    hilbert::validate_order(hilbert_order).map_err(|e| anyhow::anyhow!("{e}"))?;
    let dimension = hilbert::dimension(hilbert_order);
    let (map, warnings) = CidrMap::load(path, dimension)?;
    println!("{}", color::bold(&format!("{}", path.display())));
    println!("  entries:  {}", map.entries().len());
    println!("  warnings: {}", warnings);
    if warnings > 0 {
        println!("{}", color::yellow("  (see log output above for the skipped lines)"));
    }
    Ok(())
}
