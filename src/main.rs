// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depthview::Config;
use depthview::depth::{ColormapKind, DisplayMode};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depthview")]
#[command(about = "Depth map viewer: display conversion and mesh reconstruction")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image for display and save it as PNG
    Decode {
        input: PathBuf,

        /// Output file path (default: <input>_display.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Colormap for single-channel images (jet, plasma, viridis, magma, inferno)
        #[arg(long)]
        colormap: Option<ColormapKind>,

        /// Show single-channel images as gray
        #[arg(long)]
        no_colormap: bool,

        /// Fit the result into WxH keeping the aspect ratio
        #[arg(long, value_parser = cli::parse_size)]
        size: Option<(u32, u32)>,
    },

    /// Reconstruct a depth map and export mesh.glb and pointcloud.las
    Mesh {
        input: PathBuf,

        /// Directory receiving the scene_TIMESTAMP folder (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// points or triangles
        #[arg(long)]
        mode: Option<DisplayMode>,

        #[arg(long)]
        colormap: Option<ColormapKind>,
    },

    /// Print image size, channels, role and metadata
    Info { input: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depthview=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Decode {
            input,
            output,
            colormap,
            no_colormap,
            size,
        } => cli::decode(&config, &input, output, colormap, no_colormap, size),
        Commands::Mesh {
            input,
            output,
            mode,
            colormap,
        } => cli::mesh(&config, &input, output, mode, colormap),
        Commands::Info { input } => cli::info(&config, &input),
    }
}
