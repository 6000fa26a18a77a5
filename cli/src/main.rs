//! nanpow: compute, validate and benchmark anti-spam proofs of work.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use nanpow_types::{BlockHash, WorkNonce};
use nanpow_utils::{format_elapsed, format_rate, init_logging, LogFormat};
use nanpow_work::{validate_work, work_value, SpawnerKind, WorkConfig, WorkPool};

/// Receive-block threshold: high 32 bits of the work value must exceed it.
const DEFAULT_DIFFICULTY: &str = "fffffe00";

#[derive(Parser)]
#[command(name = "nanpow", about = "Anti-spam proof-of-work tool")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, global = true, env = "NANPOW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "NANPOW_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true, env = "NANPOW_CONFIG")]
    config: Option<PathBuf>,

    /// Number of lanes searching in parallel.
    #[arg(long, global = true, env = "NANPOW_LANES")]
    lanes: Option<usize>,

    /// Where lanes run: "thread" or "blocking".
    #[arg(long, global = true, env = "NANPOW_SPAWNER")]
    spawner: Option<SpawnerKind>,

    /// Kernel bytecode (.wasm) to use instead of the built-in kernel.
    #[arg(long, global = true, env = "NANPOW_KERNEL")]
    kernel: Option<PathBuf>,

    /// Abandon a round after this many milliseconds and start a new one.
    #[arg(long, global = true, env = "NANPOW_ROUND_TIMEOUT_MS")]
    round_timeout_ms: Option<u64>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compute a nonce for a block hash.
    Work {
        /// Block hash, 64 hex digits.
        #[arg(long)]
        hash: String,

        /// Difficulty threshold, 8 hex digits.
        #[arg(long, default_value = DEFAULT_DIFFICULTY, value_parser = parse_difficulty)]
        difficulty: u32,
    },
    /// Check a nonce against a block hash.
    Validate {
        /// Block hash, 64 hex digits.
        #[arg(long)]
        hash: String,

        /// Nonce, 16 hex digits.
        #[arg(long)]
        nonce: String,

        /// Difficulty threshold, 8 hex digits.
        #[arg(long, default_value = DEFAULT_DIFFICULTY, value_parser = parse_difficulty)]
        difficulty: u32,
    },
    /// Time a series of proofs against random hashes.
    Bench {
        /// Number of proofs to compute.
        #[arg(long, default_value_t = 10)]
        rounds: u32,

        /// Difficulty threshold, 8 hex digits.
        #[arg(long, default_value = DEFAULT_DIFFICULTY, value_parser = parse_difficulty)]
        difficulty: u32,
    },
}

fn parse_difficulty(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex difficulty `{s}`: {e}"))
}

/// File settings first, then CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<WorkConfig> {
    let mut config = match &cli.config {
        Some(path) => WorkConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WorkConfig::default(),
    };

    if let Some(lanes) = cli.lanes {
        config.lanes = lanes;
    }
    if let Some(spawner) = cli.spawner {
        config.spawner = spawner;
    }
    if let Some(kernel) = &cli.kernel {
        config.kernel_path = Some(kernel.clone());
    }
    if let Some(timeout) = cli.round_timeout_ms {
        config.round_timeout_ms = Some(timeout);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format.to_string();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Work { hash, difficulty } => {
            let hash = BlockHash::from_hex(&hash).context("--hash")?;
            let pool = WorkPool::new(&config)?;

            let started = Instant::now();
            let nonce = pool.compute_proof_of_work(hash.as_bytes(), difficulty).await?;
            let elapsed = started.elapsed();

            println!("{nonce}");
            println!(
                "elapsed: {} ({} rounds, {} lanes)",
                format_elapsed(elapsed),
                pool.rounds_started(),
                pool.lanes()
            );
        }
        Command::Validate {
            hash,
            nonce,
            difficulty,
        } => {
            let hash = BlockHash::from_hex(&hash).context("--hash")?;
            let nonce = WorkNonce::from_hex(&nonce).context("--nonce")?;

            let value = work_value(&hash, &nonce);
            println!("work value: {value:016X}");
            if !validate_work(&hash, &nonce, difficulty) {
                bail!("nonce {nonce} does not meet difficulty {difficulty:08x}");
            }
            println!("valid");
        }
        Command::Bench { rounds, difficulty } => {
            let pool = WorkPool::new(&config)?;

            let warmup = Instant::now();
            pool.ensure_ready().await?;
            tracing::info!(
                lanes = pool.lanes(),
                "pool started in {}",
                format_elapsed(warmup.elapsed())
            );

            let started = Instant::now();
            for i in 0..rounds {
                let hash: [u8; 32] = rand::random();
                let proof = Instant::now();
                let nonce = pool.compute_proof_of_work(&hash, difficulty).await?;
                tracing::debug!(proof = i, %nonce, "proof in {}", format_elapsed(proof.elapsed()));
            }
            let elapsed = started.elapsed();

            println!("proofs:  {rounds}");
            println!("rounds:  {}", pool.rounds_started());
            println!("total:   {}", format_elapsed(elapsed));
            if rounds > 0 {
                println!("average: {}", format_elapsed(elapsed / rounds));
            }
            println!("rate:    {}", format_rate(u64::from(rounds), elapsed));
        }
    }

    Ok(())
}
