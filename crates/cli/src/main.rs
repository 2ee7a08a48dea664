use anyhow::{Context, Result};
use birdnot_core::config::{self, AppConfig};
use birdnot_core::models::Category;
use birdnot_core::pipeline;
use clap::{Parser, Subcommand};
use cli::{logging, output};
use std::path::PathBuf;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load(cli.config.as_deref()).context("loading configuration")?;
    debug!(?cfg, "configuration loaded");
    let text = execute(cfg, cli.command, cli.json).await?;
    print!("{}", text);
    Ok(())
}

#[derive(Parser)]
#[command(name = "birdnot")]
#[command(about = "Collect small labelled image datasets from web image search", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for images and print the result URLs
    Search {
        /// Text to search for
        term: String,
        /// Maximum number of results
        #[arg(short, long)]
        max: Option<usize>,
    },
    /// Download every query variant for one category
    Fetch {
        /// Category label, e.g. bird
        category: String,
        /// Destination directory (defaults to <base_path>/<category>)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Shrink images in a directory to a maximum dimension
    Resize {
        dir: PathBuf,
        /// Largest allowed side in pixels
        #[arg(long)]
        max_size: Option<u32>,
    },
    /// Delete images under a directory that fail to decode
    Verify { root: PathBuf },
    /// Download one image and write a thumbnail next to it
    Preview {
        url: String,
        /// Directory to save into
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// Fetch and resize every configured category, then verify
    Run,
}

async fn execute(mut cfg: AppConfig, command: Commands, json: bool) -> Result<String> {
    if let Commands::Resize {
        max_size: Some(max), ..
    } = &command
    {
        cfg.resize.max_size = *max;
        cfg.validate()?;
    }
    let pipeline = pipeline::build_pipeline(&cfg)?;

    match command {
        Commands::Search { term, max } => {
            let max = max.unwrap_or(cfg.dataset.max_images);
            let results = pipeline.search(&term, max).await?;
            output::search(&term, &results, json)
        }
        Commands::Fetch { category, dest } => {
            let dest = dest.unwrap_or_else(|| {
                Category::new(&PathBuf::from(&cfg.dataset.base_path), &category).directory
            });
            let summary = pipeline
                .retrieve(
                    &category,
                    &cfg.dataset.terms_for(&category),
                    &dest,
                    cfg.dataset.max_images,
                )
                .await?;
            output::retrieval(&category, &dest, &summary, json)
        }
        Commands::Resize { dir, .. } => {
            let summary = pipeline.normalize(&dir).await?;
            output::normalize(&dir, &summary, json)
        }
        Commands::Verify { root } => {
            let failed = pipeline.verify(&root).await?;
            output::failures(&root, &failed, json)
        }
        Commands::Preview { url, dest } => {
            let p = pipeline
                .preview(
                    &url,
                    &dest,
                    cfg.preview.thumb_width,
                    cfg.preview.thumb_height,
                )
                .await?;
            output::preview(&p, json)
        }
        Commands::Run => {
            let summary = pipeline.run(&cfg.dataset).await?;
            output::run(&summary, json)
        }
    }
}
