use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use baseline_templates::builtin_templates;
use clap::{Parser, Subcommand};
use drift_engine::{compare, parse_tree};
use security_rules::{score_breakdown, RuleEngine};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "gwaudit",
    about = "Google Workspace configuration audit toolkit",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two configuration snapshots and report drift.
    Compare {
        /// Source snapshot (JSON file).
        source: PathBuf,
        /// Target snapshot (JSON file).
        target: PathBuf,
    },

    /// Run the security rule battery over a snapshot.
    Analyze {
        /// Configuration snapshot (JSON file).
        config: PathBuf,
    },

    /// Evaluate a snapshot and print its security score breakdown.
    Score {
        /// Configuration snapshot (JSON file).
        config: PathBuf,
    },

    /// Built-in best-practice baselines.
    Baseline {
        #[command(subcommand)]
        command: BaselineCommands,
    },
}

#[derive(Subcommand)]
enum BaselineCommands {
    /// List built-in baseline templates.
    List,

    /// Compare a snapshot against a built-in baseline.
    Check {
        /// Configuration snapshot (JSON file).
        config: PathBuf,
        /// Baseline template id (see `baseline list`).
        #[arg(long)]
        template: String,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env();
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Compare { source, target } => {
            let source = load_tree(&source)?;
            let target = load_tree(&target)?;
            let report = compare(&source, &target);
            print_json(&report)?;
        }
        Commands::Analyze { config } => {
            let config = load_tree(&config)?;
            let evaluation = RuleEngine::new().evaluate(&config);
            print_json(&evaluation)?;
        }
        Commands::Score { config } => {
            let config = load_tree(&config)?;
            let evaluation = RuleEngine::new().evaluate(&config);
            print_json(&score_breakdown(&evaluation.findings))?;
        }
        Commands::Baseline { command } => match command {
            BaselineCommands::List => {
                let metas: Vec<_> = builtin_templates()
                    .into_iter()
                    .map(|t| t.metadata)
                    .collect();
                print_json(&metas)?;
            }
            BaselineCommands::Check { config, template } => {
                let config = load_tree(&config)?;
                let Some(baseline) = builtin_templates()
                    .into_iter()
                    .find(|t| t.metadata.id == template)
                else {
                    bail!("unknown baseline template: {template}");
                };
                let report = compare(&config, &baseline.data);
                print_json(&report)?;
            }
        },
    }

    Ok(())
}

fn load_tree(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tree = parse_tree(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(tree)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
