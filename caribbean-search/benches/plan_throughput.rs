//! Plan Search Throughput Benchmark
//!
//! Measures:
//! 1. Rollouts per second at several horizons
//! 2. Plans a full 45ms budget buys for each strategy

use std::time::Instant;

use caribbean_core::{EngineState, RuleSet};
use caribbean_search::{
    evaluate_plan, rollout::plan_slots, run_search, Plan, SearchConfig, Strategy,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// BENCHMARK STRUCTURES
// ============================================================================

#[derive(Clone, Debug)]
struct BenchmarkResult {
    name: String,
    config: String,
    plans: usize,
    plans_per_second: f64,
    total_time_ms: f64,
}

impl BenchmarkResult {
    fn to_table_row(&self) -> String {
        format!(
            "| {} | {} | {} | {:.0} | {:.1}ms |",
            self.name, self.config, self.plans, self.plans_per_second, self.total_time_ms
        )
    }
}

// ============================================================================
// BENCHMARKS
// ============================================================================

fn benchmark_rollouts(state: &EngineState) -> Vec<BenchmarkResult> {
    println!("\n=== ROLLOUT BENCHMARK ===");
    let mut results = Vec::new();
    let slots = plan_slots(state, 0);
    let heuristics = Default::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for horizon in [1, 3, 5, 8] {
        print!("  horizon {} ... ", horizon);
        let plans = 2_000;
        let start = Instant::now();
        for _ in 0..plans {
            let plan = Plan::random(horizon, slots.len(), &mut rng);
            let _ = evaluate_plan(state, 0, &slots, &plan, &heuristics);
        }
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;

        results.push(BenchmarkResult {
            name: "Rollout".to_string(),
            config: format!("horizon {}", horizon),
            plans,
            plans_per_second: plans as f64 / (total_ms / 1000.0),
            total_time_ms: total_ms,
        });
        println!("{:.1}ms", total_ms);
    }

    results
}

fn benchmark_budget(state: &EngineState) -> Vec<BenchmarkResult> {
    println!("\n=== BUDGET BENCHMARK ===");
    let mut results = Vec::new();

    for strategy in [Strategy::Random, Strategy::HillClimbing] {
        let config = SearchConfig::default().with_strategy(strategy);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut plans = 0;
        let mut total_ms = 0.0;
        let iterations = 10;

        for _ in 0..iterations {
            let start = Instant::now();
            let result = run_search(state, 0, &config, start, &mut rng);
            plans += result.plans_evaluated;
            total_ms += start.elapsed().as_secs_f64() * 1000.0;
        }

        results.push(BenchmarkResult {
            name: "Search".to_string(),
            config: strategy.to_string(),
            plans: plans / iterations,
            plans_per_second: plans as f64 / (total_ms / 1000.0),
            total_time_ms: total_ms / iterations as f64,
        });
        println!("  {}: {} plans per round", strategy, plans / iterations);
    }

    results
}

fn main() {
    let state = RuleSet::default().generate_state(2017);
    println!("Benchmark position: {} ships per side", state.alive_count(0));

    let mut results = benchmark_rollouts(&state);
    results.extend(benchmark_budget(&state));

    println!("\n| Benchmark | Config | Plans | Plans/s | Time |");
    println!("|---|---|---|---|---|");
    for result in &results {
        println!("{}", result.to_table_row());
    }
}
