//! guru daemon: command-line entry point for the miner ledger.
//!
//! Each invocation opens the LMDB store, runs one command and prints a JSON
//! payload on stdout. Logs go to stderr.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use guru_accrual::AccrualEngine;
use guru_store_lmdb::environment::MAX_DBS;
use guru_store_lmdb::integrity::{check_data_dir, check_integrity};
use guru_store_lmdb::{LmdbEnvironment, LmdbLedgerStore, LmdbMetaStore, Migrator};
use guru_types::{SystemClock, Timestamp, UserId};
use guru_utils::LogFormat;
use serde_json::{json, Value};

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "guru-daemon", about = "Miner accrual ledger")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "GURU_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "GURU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GURU_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "GURU_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create or migrate the data directory and check every row.
    Init,
    /// Report liveness.
    Ping,
    /// Print the effective configuration as TOML.
    Config,
    /// Start (or resume) a user's miner.
    Start {
        #[arg(long)]
        user: UserId,
    },
    /// Settle and stop a user's miner.
    Stop {
        #[arg(long)]
        user: UserId,
    },
    /// Settle a user's accrual without stopping the miner.
    Claim {
        #[arg(long)]
        user: UserId,
    },
    /// Show a user's miner, wallet and unsettled accrual.
    Status {
        #[arg(long)]
        user: UserId,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    guru_utils::init_logging(config.log_format, &config.log_level);

    match run(cli.command, &config) {
        Ok(payload) => {
            println!("{payload}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            // Only the outermost message reaches stdout; causes stay in the log.
            println!("{}", output::error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn run(command: Command, config: &DaemonConfig) -> anyhow::Result<Value> {
    match command {
        Command::Ping => Ok(json!({ "ok": true, "time": Timestamp::now().as_millis() })),
        Command::Config => Ok(json!({ "ok": true, "config": config.to_toml_string()? })),
        Command::Init => init(config),
        Command::Start { user } => {
            let engine = open_engine(config)?;
            Ok(output::start(user, engine.start(user)?))
        }
        Command::Stop { user } => {
            let engine = open_engine(config)?;
            Ok(output::stop(user, &engine.stop(user)?))
        }
        Command::Claim { user } => {
            let engine = open_engine(config)?;
            Ok(output::claim(user, &engine.claim(user)?))
        }
        Command::Status { user } => {
            let engine = open_engine(config)?;
            Ok(output::status(&engine.status(user)?))
        }
    }
}

fn open_environment(config: &DaemonConfig) -> anyhow::Result<Arc<LmdbEnvironment>> {
    let path = config.data_dir.as_path();
    check_data_dir(path).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(path, MAX_DBS, config.store.map_size)
        .with_context(|| format!("failed to open ledger at {}", path.display()))?;
    let version = Migrator::run(&LmdbMetaStore::new(&env)).context("schema migration failed")?;
    tracing::debug!(path = %path.display(), schema_version = version, "ledger opened");
    Ok(Arc::new(env))
}

fn open_engine(
    config: &DaemonConfig,
) -> anyhow::Result<AccrualEngine<LmdbLedgerStore, SystemClock>> {
    let env = open_environment(config)?;
    let store = LmdbLedgerStore::new(env, config.store.lock_timeout());
    Ok(AccrualEngine::new(store, SystemClock, config.engine.clone())?)
}

fn init(config: &DaemonConfig) -> anyhow::Result<Value> {
    let env = open_environment(config)?;
    let report = check_integrity(&env)?;
    for problem in &report.errors {
        tracing::warn!(%problem, "integrity problem");
    }
    if !report.is_healthy() {
        anyhow::bail!(
            "integrity check failed with {} problem(s) in {}",
            report.errors.len(),
            config.data_dir.display()
        );
    }
    tracing::info!(
        miners = report.miners_checked,
        wallets = report.wallets_checked,
        "ledger ready"
    );
    Ok(json!({
        "ok": true,
        "data_dir": config.data_dir.display().to_string(),
        "schema_version": guru_store_lmdb::CURRENT_SCHEMA_VERSION,
        "miners": report.miners_checked,
        "wallets": report.wallets_checked,
    }))
}
