//! ringcast-agent - token-ring event agent.
//!
//! Usage:
//!   ringcast-agent run <id> <n> <k> <p> [--bind-host H] [--next-host H] [--config F] [--seed S]
//!   ringcast-agent simulate <n> <k> <p> [--seed S] [--deadline-secs D] [--config F]
//!
//! The leader (and `simulate`) prints exactly one `DATA_OUTPUT:` summary line
//! on stdout when the run ends.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ringcast_agent::{AgentConfig, RingParameters, Simulation, SimulationOutcome};

#[derive(Parser, Debug)]
#[command(name = "ringcast-agent")]
#[command(version, about = "Token-ring event agent with quiet-round termination", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one agent of a ring over UDP
    Run {
        /// Agent id in [0, n)
        id: u32,
        /// Ring size
        n: u32,
        /// Consecutive quiet rounds before termination
        k: u32,
        /// Initial event probability in [0, 1]
        p: f64,

        /// Host to bind the token socket on
        #[arg(long)]
        bind_host: Option<String>,

        /// Host of the successor's token socket
        #[arg(long)]
        next_host: Option<String>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed (mixed with the agent id)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a whole ring inside this process on in-memory transports
    Simulate {
        /// Ring size
        n: u32,
        /// Consecutive quiet rounds before termination
        k: u32,
        /// Initial event probability in [0, 1]
        p: f64,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Stop every agent after this many seconds
        #[arg(long, default_value_t = 60)]
        deadline_secs: u64,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            id,
            n,
            k,
            p,
            bind_host,
            next_host,
            config,
            seed,
        } => {
            let mut config = AgentConfig::load(config.as_deref())?;
            if let Some(host) = bind_host {
                config.network.bind_host = host;
            }
            if next_host.is_some() {
                config.network.next_host = next_host;
            }
            if seed.is_some() {
                config.run.seed = seed;
            }

            let cancel = CancellationToken::new();
            spawn_interrupt_handler(cancel.clone());

            let report = ringcast_agent::run_process(id, RingParameters::new(n, k, p), &config, cancel)
                .await
                .with_context(|| format!("agent {id} failed"))?;
            if let Some(stats) = report.stats {
                println!("{}", stats.summary_line());
            }
            Ok(())
        }

        Command::Simulate {
            n,
            k,
            p,
            seed,
            deadline_secs,
            config,
        } => {
            let mut config = AgentConfig::load(config.as_deref())?;
            if seed.is_some() {
                config.run.seed = seed;
            }

            let report = Simulation::new(RingParameters::new(n, k, p), config)?
                .with_deadline(Duration::from_secs(deadline_secs))
                .run()
                .await
                .context("simulation failed")?;

            if report.outcome == SimulationOutcome::SupervisionTimeout {
                tracing::warn!(
                    dropped_tokens = report.dropped_tokens,
                    "Ring stalled; stopped by the supervision deadline"
                );
            }
            println!("{}", report.stats.summary_line());
            println!("total_events={}", report.total_events);
            Ok(())
        }
    }
}

/// Ctrl-C stops the agent the same way TERMINATE does.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; shutting down");
            cancel.cancel();
        }
    });
}
