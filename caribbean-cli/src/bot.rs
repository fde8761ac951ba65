//! Bot command - play one side of a refereed game
//!
//! Each round: read the observation from stdin, rebuild the engine state from
//! it, search, and print one command per own ship. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use caribbean_core::protocol::{write_actions, Observation};
use caribbean_core::{EngineState, RuleSet};
use caribbean_search::PlanSearchAI;

use crate::SearchArgs;

/// The observing side is always player 0 in its own rebuilt state
const ME: usize = 0;

#[derive(Args)]
pub struct BotArgs {
    #[command(flatten)]
    pub search: SearchArgs,
}

/// Run the bot until stdin closes
pub fn run(args: BotArgs, seed: Option<u64>) -> Result<()> {
    let rules = args.search.rules();
    let config = args.search.search_config(seed)?;
    tracing::info!(
        "bot ready: league {}, {} search, horizon {}, budget {}ms",
        rules.league,
        config.strategy,
        config.horizon,
        config.budget_ms
    );

    let mut ai = PlanSearchAI::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    play(&mut stdin.lock(), &mut stdout.lock(), rules, &mut ai)
}

/// Protocol loop over arbitrary streams
pub fn play<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    rules: RuleSet,
    ai: &mut PlanSearchAI,
) -> Result<()> {
    let mut round = 0u32;
    while let Some(observation) = Observation::read(input).context("Failed to read round input")? {
        let round_start = Instant::now();
        let own_ships = observation.own_ship_count;
        let state = EngineState::from_observation(rules, ME, observation);

        let result = ai.search(&state, ME, round_start);
        if result.actions.len() != own_ships {
            tracing::warn!(
                "round {}: {} commands for {} reported ships",
                round,
                result.actions.len(),
                own_ships
            );
        }
        tracing::debug!(
            "round {}: {} plans in {:?}, best {:?}",
            round,
            result.plans_evaluated,
            result.elapsed,
            result.best_score()
        );

        write_actions(output, &result.actions).context("Failed to write actions")?;
        round += 1;
    }

    tracing::info!("input closed after {} rounds", round);
    Ok(())
}
