//! credence: operator CLI for the attestation ledger.
//!
//! Every subcommand opens the LMDB data directory, performs one operation and
//! prints its result as JSON on stdout. Logs go to stderr.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use credence_store::{ProfileStore, RecordStore};
use credence_store_lmdb::{check_data_dir, check_integrity, LmdbStore};
use credence_types::{AttestableRecord, BucketKey, Domain, RecordId, UserId};
use credence_utils::{init_logging, LogFormat};
use credence_verification::{ErrorCategory, ErrorKind, VerificationOrchestrator, VerifyError};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "credence", about = "Peer-verification credit ledger")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CREDENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "CREDENCE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "CREDENCE_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "CREDENCE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CREDENCE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an education or experience record to a user's profile.
    AddRecord {
        #[arg(long)]
        owner: UserId,
        #[arg(long)]
        domain: Domain,
        #[arg(long)]
        id: RecordId,
        /// Institution or company name as typed by the user.
        #[arg(long)]
        name: String,
    },
    /// Seed credits into a user's bucket for an institution or company.
    Grant {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        domain: Domain,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Spend one of the verifier's credits to attest a target's record.
    Verify {
        #[arg(long)]
        domain: Domain,
        #[arg(long)]
        verifier: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        record: String,
    },
    /// Show a user's credit buckets in one domain.
    Credits {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        domain: Domain,
    },
    /// Show one record, including who has verified it.
    Record {
        #[arg(long)]
        owner: UserId,
        #[arg(long)]
        domain: Domain,
        #[arg(long)]
        id: RecordId,
    },
    /// List a user's records in one domain.
    Records {
        #[arg(long)]
        owner: UserId,
        #[arg(long)]
        domain: Domain,
    },
    /// Settle verifications that were interrupted part-way.
    Reconcile,
    /// Walk the database and report broken invariants.
    Check,
    /// Print the effective configuration.
    Config,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: Option<ErrorKind>,
    category: Option<ErrorCategory>,
    retryable: bool,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let verify = e.downcast_ref::<VerifyError>();
            let output = ErrorOutput {
                error: verify.map(VerifyError::kind),
                category: verify.map(|v| v.kind().category()),
                retryable: verify.is_some_and(VerifyError::is_retryable),
                message: format!("{e:#}"),
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// File config (or defaults), overridden by flags and env vars.
fn load_config(cli: &Cli) -> anyhow::Result<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(mb) = cli.map_size_mb {
        config.map_size_mb = mb;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_store(config: &CliConfig) -> anyhow::Result<Arc<LmdbStore>> {
    check_data_dir(&config.data_dir)?;
    let store = LmdbStore::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?;
    tracing::debug!(data_dir = %config.data_dir.display(), "ledger opened");
    Ok(Arc::new(store))
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let store = open_store(&config)?;
    let orchestrator = VerificationOrchestrator::new(Arc::clone(&store), config.ledger.clone());

    match cli.command {
        Command::AddRecord {
            owner,
            domain,
            id,
            name,
        } => {
            let record = AttestableRecord::new(id, owner, domain, name);
            store.insert_record(&record)?;
            tracing::info!(owner = %record.owner, %domain, id = %record.id, key = %record.key, "record added");
            emit(&record)
        }
        Command::Grant {
            user,
            domain,
            name,
            count,
        } => {
            let key = BucketKey::new(&name)?;
            let mut summary = orchestrator.credit_summary(&user, domain)?;
            for _ in 0..count {
                summary = orchestrator.grant(&user, domain, &key, &name)?;
            }
            emit(&summary)
        }
        Command::Verify {
            domain,
            verifier,
            target,
            record,
        } => {
            let receipt = orchestrator.verify_raw(domain, &verifier, &target, &record)?;
            emit(&receipt)
        }
        Command::Credits { user, domain } => emit(&orchestrator.credit_summary(&user, domain)?),
        Command::Record { owner, domain, id } => {
            let record = store
                .get_record(&owner, domain, &id)?
                .ok_or(VerifyError::RecordNotFound)?;
            emit(&record)
        }
        Command::Records { owner, domain } => emit(&store.list_records(&owner, domain)?),
        Command::Reconcile => emit(&orchestrator.reconciler().run()?),
        Command::Check => {
            let report = check_integrity(&store)?;
            emit(&report)?;
            if !report.is_healthy() {
                anyhow::bail!("integrity check found {} problem(s)", report.errors.len());
            }
            Ok(())
        }
        Command::Config => Ok(()),
    }
}
