//! Selfplay command - seeded games between two searching players
//!
//! Each game generates a mirrored map from its seed. Every round both players
//! receive their protocol view of the authoritative state, search on the
//! state rebuilt from that view, and submit command lines back to the engine.
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_games(), report_results()
//! - Level 3: play_single_game()
//! - Level 4: formatting utilities

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use caribbean_core::protocol::observe;
use caribbean_core::{EngineState, GameResult, PlayerId, RoundStatus, RuleSet};
use caribbean_search::{PlanSearchAI, SearchConfig, SearchResult};

use crate::SearchArgs;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct SelfplayArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Maximum rounds per game
    #[arg(long, default_value = "200")]
    pub max_rounds: u32,

    /// Play games one at a time instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Print the final map of every game
    #[arg(long)]
    pub show_map: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub game_number: usize,
    pub seed: u64,
    pub winner: Option<PlayerId>,
    pub rounds: u32,
    /// Remaining rum per player
    pub scores: [i32; 2],
    pub ships_left: [usize; 2],
    #[serde(skip)]
    pub final_map: String,
}

/// Aggregated results
#[derive(Clone, Debug, Serialize)]
struct SelfplayResults {
    total_games: usize,
    wins: [usize; 2],
    draws: usize,
    avg_rounds: f32,
    games: Vec<GameRecord>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: SelfplayArgs, seed: Option<u64>) -> Result<()> {
    let rules = args.search.rules();
    let config = args.search.search_config(None)?;
    let base_seed = seed.unwrap_or_else(rand::random);

    tracing::info!(
        "Starting selfplay: {} games, league {}, {} search, base seed {}",
        args.games,
        rules.league,
        config.strategy,
        base_seed
    );

    let games = play_games(&args, rules, &config, base_seed)?;
    let results = compute_statistics(games);
    report_results(&results, &args);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play_games(
    args: &SelfplayArgs,
    rules: RuleSet,
    config: &SearchConfig,
    base_seed: u64,
) -> Result<Vec<GameRecord>> {
    let progress = ProgressBar::new(args.games as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} games [{elapsed_precise}]")?,
    );

    let play = |game_index: usize| {
        let seed = base_seed.wrapping_add(game_index as u64);
        let record = play_single_game(game_index + 1, seed, rules, config, args.max_rounds);
        tracing::info!(
            "Game {}: winner {:?} after {} rounds (rum {:?})",
            record.game_number,
            record.winner,
            record.rounds,
            record.scores
        );
        progress.inc(1);
        record
    };

    let games: Vec<GameRecord> = if args.sequential {
        (0..args.games).map(play).collect()
    } else {
        (0..args.games).into_par_iter().map(play).collect()
    };

    progress.finish_and_clear();
    Ok(games)
}

fn report_results(results: &SelfplayResults, args: &SelfplayArgs) {
    if args.json {
        match serde_json::to_string_pretty(results) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!("Failed to serialize results: {}", e),
        }
    } else {
        print_text_results(results);
    }

    if args.show_map {
        for game in &results.games {
            println!("\nGame {} (seed {}):\n{}", game.game_number, game.seed, game.final_map);
        }
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game to completion or the round limit
pub fn play_single_game(
    game_number: usize,
    seed: u64,
    rules: RuleSet,
    config: &SearchConfig,
    max_rounds: u32,
) -> GameRecord {
    let mut state = EngineState::generate(rules, seed);
    let mut players = [
        PlanSearchAI::with_seed(config.clone(), seed.wrapping_mul(2)),
        PlanSearchAI::with_seed(config.clone(), seed.wrapping_mul(2).wrapping_add(1)),
    ];

    while state.round < max_rounds {
        let mut outputs: [Vec<String>; 2] = Default::default();
        for (player, ai) in players.iter_mut().enumerate() {
            outputs[player] = search_turn(ai, &state, player)
                .actions
                .iter()
                .map(ToString::to_string)
                .collect();
        }

        state.begin_round();
        for (player, lines) in outputs.iter().enumerate() {
            if let Err(e) = state.apply_player_output(player, lines.as_slice()) {
                tracing::warn!("game {}: player {} forfeits: {}", game_number, player, e);
            }
        }

        if state.resolve_round() == RoundStatus::GameOver {
            break;
        }
    }

    GameRecord {
        game_number,
        seed,
        winner: decide_winner(&state),
        rounds: state.round,
        scores: [state.score(0), state.score(1)],
        ships_left: [state.alive_count(0), state.alive_count(1)],
        final_map: state.ascii_map(),
    }
}

/// One player's search on its own view, timed from when that view is ready
fn search_turn(ai: &mut PlanSearchAI, state: &EngineState, player: PlayerId) -> SearchResult {
    let round_start = Instant::now();
    let view = EngineState::from_observation(*state.rules(), player, observe(state, player));
    ai.search(&view, player, round_start)
}

/// Winner by fleets left, else by remaining rum
fn decide_winner(state: &EngineState) -> Option<PlayerId> {
    match state.result() {
        GameResult::Winner(player) => Some(player),
        GameResult::Draw => None,
        GameResult::Ongoing => match state.score(0).cmp(&state.score(1)) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        },
    }
}

fn compute_statistics(games: Vec<GameRecord>) -> SelfplayResults {
    let mut wins = [0; 2];
    let mut draws = 0;
    for game in &games {
        match game.winner {
            Some(player) => wins[player] += 1,
            None => draws += 1,
        }
    }

    let total_rounds: u32 = games.iter().map(|g| g.rounds).sum();
    let avg_rounds = if games.is_empty() {
        0.0
    } else {
        total_rounds as f32 / games.len() as f32
    };

    SelfplayResults {
        total_games: games.len(),
        wins,
        draws,
        avg_rounds,
        games,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_text_results(results: &SelfplayResults) {
    let total = results.total_games.max(1) as f32;

    println!("\n=== Selfplay Results ===");
    println!("Total games: {}", results.total_games);
    for (player, wins) in results.wins.iter().enumerate() {
        println!(
            "Player {} wins: {} ({:.1}%)",
            player,
            wins,
            *wins as f32 / total * 100.0
        );
    }
    println!("Draws:         {}", results.draws);
    println!("Avg rounds:    {:.1}", results.avg_rounds);

    println!("\n| Game | Seed | Winner | Rounds | Rum | Ships |");
    println!("|---|---|---|---|---|---|");
    for game in &results.games {
        let winner = game
            .winner
            .map_or_else(|| "draw".to_string(), |p| p.to_string());
        println!(
            "| {} | {} | {} | {} | {}/{} | {}/{} |",
            game.game_number,
            game.seed,
            winner,
            game.rounds,
            game.scores[0],
            game.scores[1],
            game.ships_left[0],
            game.ships_left[1]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> SearchConfig {
        SearchConfig::default().with_budget_ms(60_000).with_max_plans(20)
    }

    #[test]
    fn test_single_game_is_reproducible() {
        let rules = RuleSet::league(1);
        let a = play_single_game(1, 99, rules, &quick_config(), 15);
        let b = play_single_game(1, 99, rules, &quick_config(), 15);
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.final_map, b.final_map);
        assert!(a.rounds <= 15);
    }

    #[test]
    fn test_each_player_gets_full_budget() {
        let state = EngineState::generate(RuleSet::default(), 21);
        let config = SearchConfig::default().with_budget_ms(30);
        let mut first = PlanSearchAI::with_seed(config.clone(), 1);
        let mut second = PlanSearchAI::with_seed(config, 2);

        search_turn(&mut first, &state, 0);
        std::thread::sleep(std::time::Duration::from_millis(10));

        let started = Instant::now();
        let result = search_turn(&mut second, &state, 1);
        assert!(started.elapsed() >= std::time::Duration::from_millis(30));
        assert_eq!(result.actions.len(), state.alive_count(1));
    }

    #[test]
    fn test_statistics() {
        let record = |winner, rounds| GameRecord {
            game_number: 1,
            seed: 0,
            winner,
            rounds,
            scores: [0, 0],
            ships_left: [1, 1],
            final_map: String::new(),
        };
        let results = compute_statistics(vec![
            record(Some(0), 10),
            record(Some(1), 20),
            record(None, 30),
            record(Some(0), 40),
        ]);
        assert_eq!(results.wins, [2, 1]);
        assert_eq!(results.draws, 1);
        assert!((results.avg_rounds - 25.0).abs() < f32::EPSILON);
    }
}
