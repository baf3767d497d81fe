// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Command-line front end: descramble files, produce scrambled test images,
//! or fetch and descramble a batch of URLs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gilbert_descramble::telemetry::init_tracing;
use gilbert_descramble::{descramble_bytes, process_batch, scramble_bytes, Config, HttpFetcher, ImageOutcome};

#[derive(Parser)]
#[command(name = "gilbert-descramble", version, about = "Undo Gilbert-curve pixel scrambling")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "DESCRAMBLE_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Descramble a local image.
    Decode { input: PathBuf, output: PathBuf },
    /// Scramble a local image (the inverse, for producing test pairs).
    Encode { input: PathBuf, output: PathBuf },
    /// Fetch images by URL and descramble each one.
    Fetch {
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("reading configuration from environment")?,
    };
    let codec = config.codec();

    match cli.command {
        Commands::Decode { input, output } => {
            let bytes = read(&input)?;
            let restored = descramble_bytes(&bytes, &codec, &config.limits)
                .with_context(|| format!("descrambling {}", input.display()))?;
            write(&output, &restored)?;
            tracing::info!(input = %input.display(), output = %output.display(), "descrambled");
        }
        Commands::Encode { input, output } => {
            let bytes = read(&input)?;
            let scrambled = scramble_bytes(&bytes, &codec, &config.limits)
                .with_context(|| format!("scrambling {}", input.display()))?;
            write(&output, &scrambled)?;
            tracing::info!(input = %input.display(), output = %output.display(), "scrambled");
        }
        Commands::Fetch { urls, out_dir } => {
            let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs), config.fetch.force_plain_http)
                .context("building HTTP client")?;
            std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

            let outcomes = process_batch(&urls, &fetcher, &codec, &config.limits);
            let mut written = 0usize;
            for (i, outcome) in outcomes.iter().enumerate() {
                if let ImageOutcome::Descrambled { source, bytes } = outcome {
                    let path = out_dir.join(format!("descrambled_{i:03}.{}", codec.format().extension()));
                    write(&path, bytes)?;
                    tracing::info!(%source, path = %path.display(), "saved");
                    written += 1;
                }
            }
            if written == 0 {
                bail!("no image could be descrambled ({} failed)", outcomes.len());
            }
            tracing::info!(written, failed = outcomes.len() - written, "batch finished");
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
