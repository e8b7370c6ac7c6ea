//! Runoff daemon: entry point for serving or administering a runoff ledger.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use config::DaemonConfig;
use runoff_election::{ElectionService, IdAllocator};
use runoff_rpc::{RpcServer, RpcState};
use runoff_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use runoff_types::{CandidateId, Clock, Election, ElectionId, Identity, SystemClock, Timestamp};
use runoff_utils::{format_duration, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "runoff-daemon", about = "Election ledger with automatic runoffs")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, global = true, env = "RUNOFF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Ledger administrator identity.
    #[arg(long, global = true, env = "RUNOFF_ADMIN")]
    admin: Option<Identity>,

    /// LMDB map size in MiB.
    #[arg(long, global = true, env = "RUNOFF_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "RUNOFF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "RUNOFF_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

/// Caller identity and clock override shared by ledger commands.
#[derive(clap::Args)]
struct Invocation {
    /// Act as this identity (defaults to the administrator).
    #[arg(long = "as")]
    caller: Option<Identity>,

    /// Evaluate at this unix timestamp instead of the system clock.
    #[arg(long)]
    now: Option<u64>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the RPC server until interrupted.
    Serve {
        /// RPC server port.
        #[arg(long, env = "RUNOFF_RPC_PORT")]
        rpc_port: Option<u16>,

        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        bind: std::net::IpAddr,
    },
    /// Create an election opening now.
    CreateElection {
        title: String,
        /// Voting window length in seconds.
        duration_secs: u64,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        inv: Invocation,
    },
    /// Add a candidate to an election.
    AddCandidate {
        election: u64,
        name: String,
        #[command(flatten)]
        inv: Invocation,
    },
    /// Register the caller as a voter.
    Register {
        #[command(flatten)]
        inv: Invocation,
    },
    /// Cast the caller's vote.
    Vote {
        election: u64,
        candidate: u64,
        #[command(flatten)]
        inv: Invocation,
    },
    /// Finalize an election whose window has closed.
    Finalize {
        election: u64,
        #[command(flatten)]
        inv: Invocation,
    },
    /// Show an election and its timing.
    Show {
        election: u64,
        #[command(flatten)]
        inv: Invocation,
    },
    /// Print per-candidate tallies.
    Results { election: u64 },
    /// Print the winner of a finalized election.
    Winner { election: u64 },
    /// List every election.
    List,
    /// Print the runoff chain containing an election.
    Chain { election: u64 },
    /// Check the storage environment.
    Status,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "serve",
            Self::CreateElection { .. } => "create-election",
            Self::AddCandidate { .. } => "add-candidate",
            Self::Register { .. } => "register",
            Self::Vote { .. } => "vote",
            Self::Finalize { .. } => "finalize",
            Self::Show { .. } => "show",
            Self::Results { .. } => "results",
            Self::Winner { .. } => "winner",
            Self::List => "list",
            Self::Chain { .. } => "chain",
            Self::Status => "status",
        }
    }
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    election: &'a Election,
    status: &'static str,
    starts_in: String,
    remaining: String,
}

#[derive(Serialize)]
struct FinalizeOutput {
    election: ElectionId,
    requires_runoff: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    runoff_election: Option<ElectionId>,
}

#[derive(Serialize)]
struct StatusOutput {
    data_dir: PathBuf,
    databases_checked: u32,
    total_entries: u64,
    healthy: bool,
    errors: Vec<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(admin) = &cli.admin {
        config.admin = Some(admin.clone());
    }
    if let Some(mb) = cli.map_size_mb {
        config.map_size_mb = mb;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Command::Serve {
        rpc_port: Some(port), ..
    } = &cli.command
    {
        config.rpc_port = *port;
    }
    Ok(config)
}

fn open_environment(config: &DaemonConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes()?)
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))?;
    Ok(env)
}

fn open_service(config: &DaemonConfig) -> anyhow::Result<ElectionService<LmdbEnvironment>> {
    let env = open_environment(config)?;
    let admin = config.require_admin()?.clone();
    let service = ElectionService::open(env, admin, config.runoff_params(), IdAllocator::default())?;
    Ok(service)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Invocation {
    fn caller(&self, config: &DaemonConfig) -> anyhow::Result<Identity> {
        match &self.caller {
            Some(identity) => Ok(identity.clone()),
            None => Ok(config.require_admin()?.clone()),
        }
    }

    fn now(&self) -> Timestamp {
        self.now.map(Timestamp::new).unwrap_or_else(|| SystemClock.now())
    }
}

async fn serve(config: DaemonConfig, bind: std::net::IpAddr) -> anyhow::Result<()> {
    let service = open_service(&config)?;
    let addr = SocketAddr::new(bind, config.rpc_port);
    tracing::info!(
        data_dir = %config.data_dir.display(),
        rpc = %addr,
        cooldown_secs = config.runoff_cooldown_secs,
        "starting runoff daemon"
    );
    let state = RpcState::new(Arc::new(service), Arc::new(SystemClock));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
        }
        tracing::info!("shutdown signal received, stopping RPC server");
    };
    RpcServer::new(addr, state).start(shutdown).await?;
    tracing::info!("runoff daemon exited cleanly");
    Ok(())
}

fn run(config: &DaemonConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { .. } => anyhow::bail!("serve runs on the async runtime"),
        Command::Status => {
            let env = open_environment(config)?;
            let report = check_integrity(env.env())?;
            print_json(&StatusOutput {
                data_dir: config.data_dir.clone(),
                databases_checked: report.databases_checked,
                total_entries: report.total_entries,
                healthy: report.is_healthy(),
                errors: report.errors,
            })
        }
        Command::CreateElection {
            title,
            duration_secs,
            description,
            inv,
        } => {
            let svc = open_service(config)?;
            let election =
                svc.create_election(&inv.caller(config)?, &title, &description, duration_secs, inv.now())?;
            print_json(&election)
        }
        Command::AddCandidate { election, name, inv } => {
            let svc = open_service(config)?;
            let candidate = svc.add_candidate(&inv.caller(config)?, ElectionId::new(election), &name)?;
            print_json(&candidate)
        }
        Command::Register { inv } => {
            let svc = open_service(config)?;
            let caller = inv.caller(config)?;
            svc.register_to_vote(&caller)?;
            print_json(&serde_json::json!({ "identity": caller, "registered": true }))
        }
        Command::Vote {
            election,
            candidate,
            inv,
        } => {
            let svc = open_service(config)?;
            let chosen = svc.vote(
                &inv.caller(config)?,
                ElectionId::new(election),
                CandidateId::new(candidate),
                inv.now(),
            )?;
            print_json(&chosen)
        }
        Command::Finalize { election, inv } => {
            let svc = open_service(config)?;
            let outcome = svc.finalize_election(&inv.caller(config)?, ElectionId::new(election), inv.now())?;
            print_json(&FinalizeOutput {
                election: outcome.election.id,
                requires_runoff: outcome.requires_runoff(),
                runoff_election: outcome.runoff.as_ref().map(|r| r.election.id),
            })
        }
        Command::Show { election, inv } => {
            let svc = open_service(config)?;
            let now = inv.now();
            let election = svc.get_election(ElectionId::new(election))?;
            print_json(&ShowOutput {
                status: election.status(now).as_str(),
                starts_in: format_duration(election.start_time.secs_until(now)),
                remaining: format_duration(election.end_time.secs_until(now)),
                election: &election,
            })
        }
        Command::Results { election } => {
            let svc = open_service(config)?;
            print_json(&svc.get_election_results(ElectionId::new(election))?)
        }
        Command::Winner { election } => {
            let svc = open_service(config)?;
            print_json(&svc.get_winner(ElectionId::new(election))?)
        }
        Command::List => {
            let svc = open_service(config)?;
            print_json(&svc.list_elections()?)
        }
        Command::Chain { election } => {
            let svc = open_service(config)?;
            print_json(&svc.runoff_chain(ElectionId::new(election))?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }
    tracing::debug!(command = cli.command.name(), "dispatching");

    match cli.command {
        Command::Serve { bind, .. } => serve(config, bind).await,
        command => tokio::task::spawn_blocking(move || run(&config, command)).await?,
    }
}
