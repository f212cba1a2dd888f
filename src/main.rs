//! Respec - command line driver
//!
//! Replays recorded platform events through the engine, prints leaderboards
//! and toggles channel activity. Ledger state is kept in a JSON file between
//! runs.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use clap::{Parser, Subcommand, ValueEnum};
use respec::core::config::RespecConfig;
use respec::core::types::{ChannelId, Scope, ServerId};
use respec::events::PlatformEvent;
use respec::respec::MessageReport;
use respec::{Crossing, Ledger, MemoryLedger, RespecEngine, RespecError, Result};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Chat reputation engine
#[derive(Parser, Debug)]
#[command(name = "respec")]
#[command(about = "Replay chat events into respec scores and inspect leaderboards")]
struct Args {
    /// TOML config file (defaults apply when missing)
    #[arg(long, default_value = "respec.toml")]
    config: PathBuf,

    /// Ledger state file
    #[arg(long, default_value = "respec-state.json")]
    state: PathBuf,

    /// Seed for the dampening RNG, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a JSON array of platform events through the engine
    Replay { events: PathBuf },

    /// Print a leaderboard
    Board {
        #[arg(long, value_enum, default_value_t = ScopeArg::Global)]
        scope: ScopeArg,

        /// Channel or server ID for the narrower scopes
        #[arg(long)]
        target: Option<String>,
    },

    /// Turn organic respec on (or off) for a channel
    Activate {
        channel: String,

        /// Owning server, needed when the channel has never been seen
        #[arg(long)]
        server: Option<String>,

        #[arg(long)]
        off: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScopeArg {
    Channel,
    Server,
    Global,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = RespecConfig::load(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let ledger = Arc::new(MemoryLedger::load(&args.state)?);

    match args.command {
        Command::Replay { ref events } => {
            let content = fs::read_to_string(events)?;
            let events: Vec<PlatformEvent> = serde_json::from_str(&content)?;
            let engine = Arc::new(RespecEngine::new(Arc::clone(&ledger), config)?);
            let reports = replay(&engine, events)?;
            print_reports(&reports, engine.global_total(), args.json)?;
            ledger.save(&args.state)?;
        }
        Command::Board { scope, ref target } => {
            let scope = resolve_scope(scope, target.as_deref())?;
            let engine = RespecEngine::new(Arc::clone(&ledger), config)?;
            let board = engine.leaderboard(&scope)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                println!("Respec leaderboard ({})", scope.label());
                print!("{}", board.render());
            }
        }
        Command::Activate { ref channel, ref server, off } => {
            let id = ChannelId::new(channel.as_str());
            if let Some(server) = server {
                ledger.get_or_create_channel(&id, &ServerId::new(server.as_str()))?;
            }
            if !ledger.set_channel_active(&id, !off)? {
                return Err(RespecError::InvalidArgument(format!(
                    "unknown channel {} (pass --server to register it)",
                    channel
                )));
            }
            println!("{} is now {}", channel, if off { "inactive" } else { "active" });
            ledger.save(&args.state)?;
        }
    }

    Ok(())
}

/// Replay events with per-channel ordering preserved and channels in parallel
fn replay(
    engine: &Arc<RespecEngine<Arc<MemoryLedger>>>,
    events: Vec<PlatformEvent>,
) -> Result<Vec<MessageReport>> {
    let mut order: Vec<ChannelId> = Vec::new();
    let mut by_channel: AHashMap<ChannelId, Vec<PlatformEvent>> = AHashMap::new();
    for event in events {
        let id = event.channel().id.clone();
        by_channel
            .entry(id.clone())
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(event);
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let handles: Vec<_> = order
            .into_iter()
            .filter_map(|id| by_channel.remove(&id))
            .map(|batch| {
                let engine = Arc::clone(engine);
                tokio::task::spawn_blocking(move || {
                    batch
                        .iter()
                        .map(|event| engine.dispatch(event))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        let mut reports = Vec::new();
        for handle in handles {
            reports.extend(handle.await??);
        }
        Ok::<_, RespecError>(reports)
    })
}

fn resolve_scope(scope: ScopeArg, target: Option<&str>) -> Result<Scope> {
    let require = |kind: &str| {
        target.ok_or_else(|| {
            RespecError::InvalidArgument(format!("--target is required for {} scope", kind))
        })
    };
    Ok(match scope {
        ScopeArg::Channel => Scope::Channel(ChannelId::new(require("channel")?)),
        ScopeArg::Server => Scope::Server(ServerId::new(require("server")?)),
        ScopeArg::Global => Scope::Global,
    })
}

fn print_reports(reports: &[MessageReport], global_total: i64, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for applied in reports.iter().flat_map(|r| r.crossings()) {
        match applied.crossing {
            Crossing::Negative => println!("{} has lost all respec", applied.name),
            Crossing::Positive => println!("{} has earned back their respec", applied.name),
            Crossing::Stable => {}
        }
    }

    let applied = reports.iter().flat_map(|r| r.applied()).count();
    let net: i64 = reports.iter().map(MessageReport::net_delta).sum();
    println!(
        "Replayed {} events: {} respec updates, net {:+}, global total {}",
        reports.len(),
        applied,
        net,
        global_total
    );
    Ok(())
}
