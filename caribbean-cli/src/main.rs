//! Caribbean CLI - Command-line interface
//!
//! Commands:
//! - bot: Play one side of a refereed game over stdin/stdout
//! - selfplay: Run seeded games between two searching players

mod bot;
mod selfplay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use caribbean_core::RuleSet;
use caribbean_search::{SearchConfig, Strategy};

#[derive(Parser)]
#[command(name = "caribbean")]
#[command(about = "Hex naval combat engine and plan search bot")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read rounds from stdin, write one command per ship to stdout
    Bot(bot::BotArgs),
    /// Play seeded games between two searching players
    Selfplay(selfplay::SelfplayArgs),
}

/// Rule tier and search options shared by every command
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// League tier (0-3)
    #[arg(long, default_value = "3")]
    pub league: u8,

    /// Search configuration JSON file; flags below override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Plan search strategy (random, hill_climbing)
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Lookahead rounds per plan
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub horizon: Option<usize>,

    /// Search budget per round in milliseconds
    #[arg(long)]
    pub budget_ms: Option<u64>,

    /// Upper bound on plans evaluated per round
    #[arg(long)]
    pub max_plans: Option<usize>,
}

impl SearchArgs {
    pub fn rules(&self) -> RuleSet {
        RuleSet::league(self.league)
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn search_config(&self, seed: Option<u64>) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load(path)
                .with_context(|| format!("Failed to load search config: {}", path.display()))?,
            None => SearchConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(horizon) = self.horizon {
            config = config.with_horizon(horizon);
        }
        if let Some(budget_ms) = self.budget_ms {
            config = config.with_budget_ms(budget_ms);
        }
        if let Some(max_plans) = self.max_plans {
            config = config.with_max_plans(max_plans);
        }
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Stdout carries protocol and report output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bot(args) => bot::run(args, cli.seed),
        Commands::Selfplay(args) => selfplay::run(args, cli.seed),
    }
}
