//! scene-codec - scene container inspection tool
//!
//! Prints, extracts from and re-encodes compressed scene files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use scene_codec::{CodecConfig, DecodedModel, ModelSummary, SceneCodec};

#[derive(Parser)]
#[command(name = "scene-codec")]
#[command(about = "Scene container inspection tool")]
#[command(version)]
struct Cli {
    /// Path to a scene-codec.toml (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node tree of a scene file
    Inspect {
        /// Input scene file
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the thumbnail as PNG
    Thumbnail {
        /// Input scene file
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode a scene file and encode it again with the current settings
    Repack {
        /// Input scene file
        input: PathBuf,

        /// Output scene file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CodecConfig::default(),
    };
    let codec = SceneCodec::from_config(&config);

    match cli.command {
        Commands::Inspect { input, json } => {
            let model = load(&codec, &input)?;
            let summary = ModelSummary::from_model(&model);
            if json {
                println!(
                    "{}",
                    summary.to_json().context("Failed to serialize summary")?
                );
            } else {
                print!("{summary}");
            }
        }
        Commands::Thumbnail { input, output } => {
            let model = load(&codec, &input)?;
            let thumbnail = model
                .thumbnail()
                .with_context(|| format!("{} has no thumbnail", input.display()))?;
            thumbnail
                .save_with_format(&output, image::ImageFormat::Png)
                .with_context(|| format!("Failed to write thumbnail: {}", output.display()))?;
            tracing::info!(
                "Wrote {}x{} thumbnail to {}",
                thumbnail.width(),
                thumbnail.height(),
                output.display()
            );
        }
        Commands::Repack { input, output } => {
            let model = load(&codec, &input)?;
            let bytes = match &model {
                DecodedModel::Static(model) => {
                    let root = model.clone().into_root("root");
                    codec.encode_static(&root, model.thumbnail.as_ref())
                }
                DecodedModel::Avatar(model) => codec.encode_avatar(&model.root, &model.thumbnail),
            }
            .with_context(|| format!("Failed to encode {}", input.display()))?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write: {}", output.display()))?;
            println!("Created: {} ({} bytes)", output.display(), bytes.len());
        }
    }

    Ok(())
}

fn load(codec: &SceneCodec, path: &Path) -> Result<DecodedModel> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    codec
        .decode_any(&data)
        .with_context(|| format!("Failed to decode: {}", path.display()))
}
