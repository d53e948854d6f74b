mod config;
mod site;
mod spectrograms;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use config::SiteConfig;

/// Builds and checks the speech-enhancement comparison page
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (built-in defaults when not given)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the page and its assets live in
    #[arg(long, default_value = ".", global = true)]
    site_root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Draw a mel spectrogram PNG for every sample WAV
    Spectrograms {
        /// Input tree of `<method>/<id>.wav`, relative to the site root
        #[arg(long)]
        audio_dir: Option<String>,
        /// Output tree, relative to the site root
        #[arg(long)]
        out_dir: Option<String>,
        /// Files processed at once
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Render the comparison page
    Build {
        /// Use this manifest instead of scanning the audio tree
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Save the catalog as a manifest
        #[arg(long)]
        write_manifest: Option<PathBuf>,
        /// Page path (defaults to the configured output under the site root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate the catalog and confirm every asset resolves
    Check {
        /// Use this manifest instead of scanning the audio tree
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    {
        use tracing_subscriber::prelude::*;

        let log_level = if cli.verbose { "debug" } else { "info" };
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
            )
            .init()
    }

    let mut config = SiteConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Spectrograms {
            audio_dir,
            out_dir,
            jobs,
        } => {
            if let Some(audio_dir) = audio_dir {
                config.audio_dir = audio_dir;
            }
            if let Some(out_dir) = out_dir {
                config.spectrogram_dir = out_dir;
            }
            let audio_root = cli.site_root.join(&config.audio_dir);
            let out_root = cli.site_root.join(&config.spectrogram_dir);
            let jobs = jobs.unwrap_or_else(spectrograms::default_jobs);

            let start = std::time::Instant::now();
            let report =
                spectrograms::generate_all(&audio_root, &out_root, &config.spectrogram, jobs).await?;
            let elapsed = start.elapsed();
            info!(?elapsed, "completed batch");

            println!("Generated {}/{} spectrograms in {}", report.generated, report.total, out_root.display());
            if !report.failed.is_empty() {
                for (input, reason) in &report.failed {
                    eprintln!("✗ {}: {reason}", input.display());
                }
                bail!("{} file(s) failed", report.failed.len());
            }
        }
        Command::Build {
            manifest,
            write_manifest,
            output,
        } => {
            let output = site::build(
                &config,
                &cli.site_root,
                manifest.as_deref(),
                write_manifest.as_deref(),
                output,
            )?;
            println!("Wrote {}", output.display());
        }
        Command::Check { manifest } => {
            site::check(&config, &cli.site_root, manifest.as_deref()).await?;
        }
    }

    Ok(())
}
