//! Caribbean Search - time-boxed lookahead for the naval engine
//!
//! This crate picks each round's commands for one player:
//! - Plans of per-ship action codes over a short horizon
//! - Rollouts of a plan on an independent copy of the engine state
//! - Random sampling or hill climbing under a wall-clock budget

pub mod plan;
pub mod rollout;
pub mod search;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use caribbean_core::{CommandLine, EngineState, Heuristics, PlayerId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub use plan::{ActionCode, Plan};
pub use rollout::{evaluate_plan, intercept_point, RolloutResult};
pub use search::{run_search, Deadline, SearchResult};

/// How candidate plans are generated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Random,
    HillClimbing,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Strategy::Random),
            "hill_climbing" | "hill-climbing" => Ok(Strategy::HillClimbing),
            other => Err(format!("unknown strategy '{}' (random, hill_climbing)", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Random => f.write_str("random"),
            Strategy::HillClimbing => f.write_str("hill_climbing"),
        }
    }
}

/// Search configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: Strategy,
    /// Lookahead rounds per plan
    pub horizon: usize,
    /// Wall-clock budget per round, from round start
    pub budget_ms: u64,
    pub max_plans: usize,
    pub seed: Option<u64>,
    pub heuristics: Heuristics,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Random,
            horizon: 5,
            budget_ms: 45,
            max_plans: 100_000,
            seed: None,
            heuristics: Heuristics::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_budget_ms(mut self, budget_ms: u64) -> Self {
        self.budget_ms = budget_ms;
        self
    }

    pub fn with_max_plans(mut self, max_plans: usize) -> Self {
        self.max_plans = max_plans;
        self
    }

    /// Load from JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        anyhow::ensure!(config.horizon > 0, "horizon must be at least 1");
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// A player that searches plans for its own ships every round
pub struct PlanSearchAI {
    pub config: SearchConfig,
    rng: ChaCha8Rng,
}

impl PlanSearchAI {
    /// Seeded from `config.seed`, or from entropy if unset
    pub fn new(config: SearchConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_seed(config: SearchConfig, seed: u64) -> Self {
        Self::new(config.with_seed(seed))
    }

    /// Full search result for `me` this round
    pub fn search(&mut self, state: &EngineState, me: PlayerId, round_start: Instant) -> SearchResult {
        run_search(state, me, &self.config, round_start, &mut self.rng)
    }

    /// One command per alive own ship
    pub fn choose_actions(
        &mut self,
        state: &EngineState,
        me: PlayerId,
        round_start: Instant,
    ) -> Vec<CommandLine> {
        self.search(state, me, round_start).actions
    }
}
