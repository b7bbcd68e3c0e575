//! fcrypt: streaming symmetric file encryption CLI
//!
//! Commands:
//!   encrypt <input> <output>  - encrypt a file, writing <output>.key
//!   decrypt <input> <output>  - decrypt a file using its key file
//!   algorithms                - list supported ciphers
//!
//! The key file is two Base64 lines (key, then IV); keep it next to the
//! ciphertext or the file cannot be decrypted.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fcrypt_cipher::{resolve, CipherSpec, CIPHERS};
use fcrypt_core::config::FcryptConfig;
use fcrypt_core::{Direction, FcryptError};
use fcrypt_engine::{Progress, ProgressFn, TransformOptions};

// ── CLI structure ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fcrypt",
    version,
    about = "Streaming symmetric file encryption",
    long_about = "fcrypt: encrypt or decrypt a file with AES, DES, RC2, or Rijndael,\n\
                  producing a companion key file that records the key and IV"
)]
struct Cli {
    /// Path to fcrypt.toml configuration file
    #[arg(long, short = 'c', env = "FCRYPT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file, writing the key and IV to a companion key file
    Encrypt {
        /// Plaintext input file
        input: PathBuf,
        /// Ciphertext output file
        output: PathBuf,
        /// Cipher algorithm: AES, DES, RC2, or Rijndael (case-insensitive)
        #[arg(long, short = 'a', env = "FCRYPT_ALGORITHM")]
        algorithm: Option<String>,
        /// Key file path (default: <output>.key)
        #[arg(long, short = 'k')]
        key_file: Option<PathBuf>,
    },

    /// Decrypt a file using a previously written key file
    Decrypt {
        /// Ciphertext input file
        input: PathBuf,
        /// Plaintext output file
        output: PathBuf,
        /// Cipher algorithm the file was encrypted with
        #[arg(long, short = 'a', env = "FCRYPT_ALGORITHM")]
        algorithm: Option<String>,
        /// Key file produced by the matching encrypt run
        #[arg(long, short = 'k')]
        key_file: PathBuf,
    },

    /// List supported algorithms and their key/block sizes
    Algorithms,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;
    init_logging(&config.log.level, &config.log.format);

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            algorithm,
            key_file,
        } => {
            let key_file = key_file.unwrap_or_else(|| default_key_path(&output));
            run_transform(
                &config,
                Direction::Encrypt,
                &input,
                &output,
                &key_file,
                algorithm.as_deref(),
            )
            .await
        }
        Commands::Decrypt {
            input,
            output,
            algorithm,
            key_file,
        } => {
            run_transform(
                &config,
                Direction::Decrypt,
                &input,
                &output,
                &key_file,
                algorithm.as_deref(),
            )
            .await
        }
        Commands::Algorithms => cmd_algorithms(),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

async fn load_config(path: Option<&Path>) -> Result<FcryptConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(".config/fcrypt/fcrypt.toml")
        }
    };
    if path.exists() {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(FcryptConfig::default())
    }
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

/// The bar tracks fractional progress in per-mille steps; sources without
/// a known length get a spinner with a running byte count.
fn make_progress_bar(total: Option<u64>, direction: Direction, spec: &CipherSpec) -> ProgressBar {
    let pb = match total {
        Some(_) => {
            let pb = ProgressBar::new(1000);
            pb.set_style(
                ProgressStyle::with_template(
                    "{prefix:.bold} [{bar:40.cyan/blue}] {percent}% {msg}",
                )
                .unwrap()
                .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}").unwrap());
            pb
        }
    };
    pb.set_prefix(format!("{direction} {}", spec.name()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ── Transform execution ───────────────────────────────────────────────────────

fn default_key_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".key");
    PathBuf::from(name)
}

async fn run_transform(
    config: &FcryptConfig,
    direction: Direction,
    input: &Path,
    output: &Path,
    key_file: &Path,
    algorithm: Option<&str>,
) -> Result<()> {
    // Resolve the algorithm before touching any stream.
    let name = algorithm.unwrap_or(&config.engine.default_algorithm);
    let spec = resolve(name).ok_or_else(|| FcryptError::UnknownAlgorithm(name.to_string()))?;

    let in_file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("opening input: {}", input.display()))?;
    let total = in_file.metadata().await.ok().map(|m| m.len());
    let out_file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("creating output: {}", output.display()))?;

    // Ctrl-C cancels cooperatively between chunks.
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let pb = make_progress_bar(total, direction, spec);
    let bar = pb.clone();
    let progress: ProgressFn = Box::new(move |signal| match signal {
        Progress::Fraction(fraction) => bar.set_position((fraction * 1000.0).round() as u64),
        Progress::Indeterminate(bytes) => bar.set_message(format!("{bytes} bytes")),
    });

    let opts = TransformOptions {
        chunk_size: config.engine.chunk_size,
        total_len: total,
        progress: Some(&progress),
        cancel,
    };

    info!(
        %direction,
        algorithm = spec.name(),
        input = %input.display(),
        output = %output.display(),
        "starting transform"
    );

    let result = match direction {
        Direction::Encrypt => {
            let key_out = tokio::fs::File::create(key_file)
                .await
                .with_context(|| format!("creating key file: {}", key_file.display()))?;
            fcrypt_engine::encrypt(spec, in_file, out_file, key_out, &opts).await
        }
        Direction::Decrypt => {
            let key_in = tokio::fs::File::open(key_file)
                .await
                .with_context(|| format!("opening key file: {}", key_file.display()))?;
            fcrypt_engine::decrypt(spec, in_file, out_file, key_in, &opts).await
        }
    };

    match result {
        Ok(()) => {
            pb.finish_and_clear();
            match direction {
                Direction::Encrypt => println!(
                    "Encrypted {} -> {}  (key file: {})",
                    input.display(),
                    output.display(),
                    key_file.display()
                ),
                Direction::Decrypt => {
                    println!("Decrypted {} -> {}", input.display(), output.display())
                }
            }
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            // A failed or cancelled run leaves a partial, untrustworthy
            // output file; remove it, and on encrypt the unusable key file
            // with it.
            remove_partial(output).await;
            if direction == Direction::Encrypt {
                remove_partial(key_file).await;
            }
            Err(e).with_context(|| format!("{direction}ing {}", input.display()))
        }
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("could not remove partial file {}: {e}", path.display());
        }
    }
}

// ── `fcrypt algorithms` ───────────────────────────────────────────────────────

fn cmd_algorithms() -> Result<()> {
    println!("{:<10} {:>9} {:>11}", "NAME", "KEY BITS", "BLOCK BITS");
    for spec in &CIPHERS {
        println!(
            "{:<10} {:>9} {:>11}",
            spec.name(),
            spec.key_len() * 8,
            spec.block_len() * 8
        );
    }
    Ok(())
}
