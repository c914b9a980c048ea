//! Identify audio files by acoustic fingerprint and embedded tags, then move
//! each one to `<dest>/<artist>/<title>.<ext>`.
//!
//! Usage:
//!     aidmatch [--dest DIR] [--dry-run] [--verbose] file1.mp3 file2.mp3 ...

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use aidmatch::{AcoustIdClient, Config, EmbeddedTags, Organizer};

#[derive(Debug, Parser)]
#[command(version, about = "Rename audio files after their most likely artist and title")]
struct Cli {
    /// Audio files to identify
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// AcoustID application key
    #[arg(long, env = "ACOUSTID_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory that receives the <artist>/<title> tree [default: .]
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Fingerprint matches must score above this confidence [default: 0.90]
    #[arg(long)]
    threshold: Option<f64>,

    /// Weight of each embedded tag value [default: 2]
    #[arg(long)]
    tag_weight: Option<u32>,

    /// Path to the Chromaprint fpcalc executable [default: fpcalc]
    #[arg(long, env = "FPCALC")]
    fpcalc: Option<PathBuf>,

    /// Show the result without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Store the given options as defaults for later runs
    #[arg(long)]
    save_defaults: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            api_key: self.api_key.clone(),
            fpcalc: self.fpcalc.clone(),
            dest: self.dest.clone(),
            threshold: self.threshold,
            tag_weight: self.tag_weight,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<bool> {
    let mut config = Config::load().context("failed to load saved defaults")?;
    config.merge(&cli.overrides());

    if cli.save_defaults {
        let path = config.save().context("failed to save defaults")?;
        config.print(&format!("Saved defaults to {}", path.display()));
    }

    let settings = config.settings()?;
    let api_key = config.require_api_key()?;
    let client = AcoustIdClient::with_fpcalc(api_key, &config.fpcalc_path());
    let mut organizer =
        Organizer::new(client, EmbeddedTags, settings, &config.dest_dir()).dry_run(cli.dry_run);

    let mut all_ok = true;
    for file in &cli.files {
        match organizer.process(file) {
            Ok(outcome) => {
                println!(
                    "{} ~> \"{}\" by {}",
                    file.display(),
                    outcome.identification.title,
                    outcome.identification.artist
                );
            }
            Err(e) => {
                error!("{}: {}", file.display(), e);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
