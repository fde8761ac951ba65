//! Time-boxed plan search
//!
//! Two strategies over the same plan space:
//! 1. Random sampling - draw whole plans, keep the strictly best
//! 2. Hill climbing - mutate one slot at a time, keep mutations that do not
//!    score worse
//!
//! The deadline is polled before each rollout; a rollout in progress always
//! runs to completion.

use std::time::{Duration, Instant};

use caribbean_core::{
    Command, CommandLine, Coord, EngineState, EntityId, Heuristics, PlayerId, MAP_HEIGHT,
    MAP_WIDTH,
};
use rand::Rng;

use crate::plan::Plan;
use crate::rollout::{evaluate_plan, plan_slots, to_command};
use crate::{SearchConfig, Strategy};

// ============================================================================
// DEADLINE
// ============================================================================

/// Wall-clock budget measured from the start of the round
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// If the round start is already more than one budget ago (slow first
    /// round), the budget restarts from now.
    pub fn new(round_start: Instant, budget: Duration) -> Self {
        let start = if round_start.elapsed() > budget {
            Instant::now()
        } else {
            round_start
        };
        Self { start, budget }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// ============================================================================
// SEARCH RESULT
// ============================================================================

/// Outcome of one search
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// One command per alive own ship, in roster order
    pub actions: Vec<CommandLine>,
    /// Best plan found and its score (None when the fallback was used)
    pub best: Option<(Plan, i32)>,
    pub plans_evaluated: usize,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn used_fallback(&self) -> bool {
        self.best.is_none()
    }

    pub fn best_score(&self) -> Option<i32> {
        self.best.as_ref().map(|(_, score)| *score)
    }
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Shared inputs for one search
struct SearchContext<'a> {
    root: &'a EngineState,
    me: PlayerId,
    slots: Vec<EntityId>,
    horizon: usize,
    max_plans: usize,
    heuristics: &'a Heuristics,
    deadline: Deadline,
}

impl SearchContext<'_> {
    fn can_evaluate(&self, evaluated: usize) -> bool {
        evaluated < self.max_plans && !self.deadline.expired()
    }

    fn score(&self, plan: &Plan) -> i32 {
        evaluate_plan(self.root, self.me, &self.slots, plan, self.heuristics).score
    }
}

/// Keep the first plan with the highest score
fn random_sampling<R: Rng>(ctx: &SearchContext, rng: &mut R) -> (Option<(Plan, i32)>, usize) {
    let mut best: Option<(Plan, i32)> = None;
    let mut evaluated = 0;

    while ctx.can_evaluate(evaluated) {
        let plan = Plan::random(ctx.horizon, ctx.slots.len(), rng);
        let score = ctx.score(&plan);
        evaluated += 1;

        if best.as_ref().map_or(true, |(_, b)| score > *b) {
            best = Some((plan, score));
        }
    }

    (best, evaluated)
}

/// Walk from one random plan through single-slot mutations, accepting ties
fn hill_climbing<R: Rng>(ctx: &SearchContext, rng: &mut R) -> (Option<(Plan, i32)>, usize) {
    if !ctx.can_evaluate(0) {
        return (None, 0);
    }

    let mut current = Plan::random(ctx.horizon, ctx.slots.len(), rng);
    let mut current_score = ctx.score(&current);
    let mut evaluated = 1;

    while ctx.can_evaluate(evaluated) {
        let candidate = current.mutation(rng);
        let score = ctx.score(&candidate);
        evaluated += 1;

        if score >= current_score {
            current = candidate;
            current_score = score;
        }
    }

    (Some((current, current_score)), evaluated)
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Search for `me`'s best first-round commands within the configured budget
pub fn run_search<R: Rng>(
    root: &EngineState,
    me: PlayerId,
    config: &SearchConfig,
    round_start: Instant,
    rng: &mut R,
) -> SearchResult {
    let deadline = Deadline::new(round_start, Duration::from_millis(config.budget_ms));
    let slots = plan_slots(root, me);

    if slots.is_empty() {
        return SearchResult {
            actions: Vec::new(),
            best: None,
            plans_evaluated: 0,
            elapsed: deadline.elapsed(),
        };
    }

    let ctx = SearchContext {
        root,
        me,
        slots,
        horizon: config.horizon.max(1),
        max_plans: config.max_plans,
        heuristics: &config.heuristics,
        deadline,
    };

    let (best, plans_evaluated) = match config.strategy {
        Strategy::Random => random_sampling(&ctx, rng),
        Strategy::HillClimbing => hill_climbing(&ctx, rng),
    };

    let actions = match &best {
        Some((plan, score)) if plan.first_round().len() == ctx.slots.len() => {
            tracing::debug!(
                "{:?} search: {} plans, best score {}",
                config.strategy,
                plans_evaluated,
                score
            );
            first_round_commands(root, &ctx.slots, plan)
        }
        _ => {
            tracing::warn!("no complete plan was scored, using fallback");
            fallback_commands(root, &ctx.slots, rng)
        }
    };

    SearchResult {
        actions,
        best,
        plans_evaluated,
        elapsed: deadline.elapsed(),
    }
}

/// Commands for the plan's first round, targeting FIRE against `root`
fn first_round_commands(root: &EngineState, slots: &[EntityId], plan: &Plan) -> Vec<CommandLine> {
    slots
        .iter()
        .zip(plan.first_round())
        .map(|(&id, &code)| {
            let ship = root
                .ship(id)
                .expect("plan slot refers to a ship missing from the root state");
            CommandLine::new(to_command(root, ship, code))
        })
        .collect()
}

/// Head for the nearest barrel, or for a random waypoint if none is left
pub fn fallback_commands<R: Rng>(
    root: &EngineState,
    slots: &[EntityId],
    rng: &mut R,
) -> Vec<CommandLine> {
    slots
        .iter()
        .map(|&id| {
            let barrel = root
                .ship(id)
                .and_then(|ship| root.nearest_barrel(ship.position));
            let target = match barrel {
                Some(barrel) => barrel.position,
                None => Coord::new(rng.gen_range(0..MAP_WIDTH), rng.gen_range(0..MAP_HEIGHT)),
            };
            CommandLine::new(Command::Move(target))
        })
        .collect()
}
