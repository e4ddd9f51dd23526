//! CLI definitions for threatplot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(
    name = "threatplot",
    version,
    about = "Render honeypot/security event logs as an animated Hilbert-curve attack heatmap",
    long_about = None
)]
pub struct Cli {
    /// Path to threatplot.toml config file
    #[clap(long, short, default_value = "threatplot.toml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse input logs and render a PPM frame sequence (and optionally a video)
    Render {
        /// Input log file(s), plain or gzip-compressed. Overrides `inputs` in the config file.
        inputs: Vec<PathBuf>,

        /// Directory to write PPM frames into. Overrides `output_dir` in the config file.
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },

    /// Load and validate a CIDR map file, reporting entry count and parse warnings
    CheckCidr {
        /// Path to the CIDR map file
        path: PathBuf,

        /// Hilbert order used to bound each entry's X range
        #[clap(long, default_value_t = 12)]
        hilbert_order: u8,
    },

    /// Print an example threatplot.toml to stdout
    Init,
}
