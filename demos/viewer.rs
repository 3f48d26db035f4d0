//! glTF model viewer
//!
//! ```text
//! viewer --model assets/model.glb
//! viewer --config viewer.toml --mode pick
//! ```
//!
//! Controls:
//!   Left drag   orbit
//!   Right drag  pan
//!   Scroll      zoom
//!   Click       pick (pick mode)
//!   T           toggle part (pick mode)
//!   Esc         quit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use modelview_core::Color;
use modelview_visualization::{InteractionMode, InteractiveViewer, ViewerConfig};

#[derive(Parser)]
#[command(name = "viewer")]
#[command(about = "Display a glTF model with orbit controls")]
struct Cli {
    /// Model to load (.gltf or .glb)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Interaction mode: free-orbit or pick
    #[arg(long)]
    mode: Option<InteractionMode>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial model color as #rrggbb (free-orbit mode)
    #[arg(long)]
    color: Option<Color>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model_path = Some(model);
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(color) = cli.color {
        config.color = color;
    }

    if config.model_path.is_none() {
        tracing::warn!("No model given; pass --model or set model_path in the config");
    }

    InteractiveViewer::new(config).run().context("Viewer failed")?;
    Ok(())
}
