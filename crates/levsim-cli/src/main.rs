use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use levsim_broker::{EpisodeSummary, TradingEnv};
use levsim_config::{ActionMode, UnusedKeyPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

mod rows;

#[derive(Parser)]
#[command(name = "levsim")]
#[command(about = "Leveraged single-instrument broker simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run one episode over a CSV of market rows and print the summary as JSON
    Replay {
        /// Layered config paths in merge order. Defaults apply when omitted.
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// CSV with one market row per line; numeric columns become fields
        #[arg(long)]
        rows: String,

        /// Column holding a raw action per row. Overrides --policy.
        #[arg(long)]
        action_column: Option<String>,

        #[arg(long, value_enum, default_value_t = Policy::Hold)]
        policy: Policy,

        /// Seed for the randomized starting inventory
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Refuse configs carrying keys the simulator does not read
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

/// Fixed action schedules for replays without an action column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    Hold,
    Long,
    Short,
    /// Long on even steps, short on odd steps
    Alternate,
}

impl Policy {
    fn raw_action(self, step: usize, mode: ActionMode) -> f64 {
        let (long, short, hold) = match mode {
            ActionMode::Discrete => (0.0, 1.0, 2.0),
            ActionMode::Continuous => (1.0, -1.0, 0.0),
        };
        match self {
            Policy::Hold => hold,
            Policy::Long => long,
            Policy::Short => short,
            Policy::Alternate if step % 2 == 0 => long,
            Policy::Alternate => short,
        }
    }
}

#[derive(Serialize)]
struct ReplayReport {
    config_hash: String,
    rows: usize,
    #[serde(flatten)]
    summary: EpisodeSummary,
}

fn init_tracing() {
    // stdout carries the JSON report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let loaded = levsim_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Replay {
            config_paths,
            rows,
            action_column,
            policy,
            seed,
            strict,
        } => {
            let loaded = levsim_config::load_layered_yaml(&config_paths)?;
            let unused_policy = if strict {
                UnusedKeyPolicy::Fail
            } else {
                UnusedKeyPolicy::Warn
            };
            levsim_config::report_unused_keys(&loaded.config_json, unused_policy)?;
            let cfg = loaded.sim()?;

            let data = rows::load_rows_csv(&rows, action_column.as_deref())?;
            let n_rows = data.rows.len();
            let mut env = TradingEnv::new(&cfg, data.rows).context("build trading env")?;
            let mode = env.action_mode();

            let mut rng = StdRng::seed_from_u64(seed);
            env.reset(&mut rng).context("reset episode")?;
            info!(
                config_hash = %loaded.config_hash,
                rows = n_rows,
                strategy = %env.broker().strategy_kind(),
                "replay started"
            );

            let mut step = 0usize;
            loop {
                let raw = match &data.actions {
                    Some(actions) => actions.get(step).copied().unwrap_or(f64::NAN),
                    None => policy.raw_action(step, mode),
                };
                let out = env
                    .step(raw)
                    .with_context(|| format!("step {step}"))?;
                step += 1;
                if out.terminated {
                    break;
                }
            }

            let report = ReplayReport {
                config_hash: loaded.config_hash,
                rows: n_rows,
                summary: env.summary(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
