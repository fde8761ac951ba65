//! Rollouts: play a plan forward on a copy of the state and score it
//!
//! Own ships follow the plan; enemy ships are left without orders and only
//! keep their current speed and heading.

use caribbean_core::{
    evaluate, Command, CommandLine, Coord, EngineState, EntityId, Heuristics, PlayerId,
    RoundStatus, Ship,
};

use crate::plan::{ActionCode, Plan};

// ============================================================================
// FIRE TARGETING
// ============================================================================

/// Where the nearest enemy of `shooter` will be when a shot fired now lands.
///
/// The enemy is projected along its heading at its current speed for the
/// shot's flight time; if that leaves the map, its current cell is used.
pub fn intercept_point(state: &EngineState, shooter: &Ship) -> Option<Coord> {
    let enemy = state.nearest_enemy(shooter.id)?;
    let rounds = 1 + shooter.position.distance_to(enemy.position) / 3;

    let mut predicted = enemy.position;
    for _ in 0..rounds * enemy.speed {
        predicted = predicted.neighbor(enemy.orientation);
    }

    if predicted.is_inside_map() {
        Some(predicted)
    } else {
        Some(enemy.position)
    }
}

/// Concrete command for an action code, against the current state.
/// FIRE without any enemy left becomes WAIT.
pub fn to_command(state: &EngineState, ship: &Ship, code: ActionCode) -> Command {
    match code {
        ActionCode::Fire => intercept_point(state, ship)
            .map(Command::Fire)
            .unwrap_or(Command::Wait),
        ActionCode::Mine => Command::Mine,
        ActionCode::Port => Command::Port,
        ActionCode::Starboard => Command::Starboard,
        ActionCode::Faster => Command::Faster,
        ActionCode::Slower => Command::Slower,
        ActionCode::Wait => Command::Wait,
    }
}

// ============================================================================
// PLAN EVALUATION
// ============================================================================

/// Result of one rollout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolloutResult {
    pub score: i32,
    /// Rounds actually simulated (fewer than the horizon if the game ended)
    pub rounds_played: usize,
}

/// Play `plan` for `me` from `root` and score the end state against it.
///
/// `slots` maps plan ship slots to ship ids; ships that sink mid-rollout
/// are skipped for the remaining rounds.
pub fn evaluate_plan(
    root: &EngineState,
    me: PlayerId,
    slots: &[EntityId],
    plan: &Plan,
    heuristics: &Heuristics,
) -> RolloutResult {
    let mut sim = root.snapshot();
    sim.reset_ledger();

    let mut rounds_played = 0;
    for round in 0..plan.horizon() {
        sim.begin_round();
        for (slot, &id) in slots.iter().enumerate() {
            let Some(ship) = sim.ship(id) else {
                continue;
            };
            let command = to_command(&sim, ship, plan.get(round, slot));
            sim.apply_command(id, &CommandLine::new(command));
        }

        rounds_played += 1;
        if sim.resolve_round() == RoundStatus::GameOver {
            break;
        }
    }

    RolloutResult {
        score: evaluate(root, &sim, me, heuristics),
        rounds_played,
    }
}

/// Alive ship ids of `me`, in the order plan slots refer to them
pub fn plan_slots(state: &EngineState, me: PlayerId) -> Vec<EntityId> {
    state.fleet(me).alive().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use caribbean_core::RuleSet;

    fn duel(own_health: i32) -> EngineState {
        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(4, 10), 0, 0).with_health(own_health));
        state.add_ship(Ship::new(1, Coord::new(10, 10), 0, 1).with_speed(1));
        state
    }

    #[test]
    fn test_intercept_leads_moving_target() {
        let state = duel(100);
        let shooter = state.ship(0).unwrap();
        // Distance 6 means three rounds of flight at speed 1
        assert_eq!(intercept_point(&state, shooter), Some(Coord::new(13, 10)));
    }

    #[test]
    fn test_intercept_stationary_and_off_map() {
        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(15, 10), 0, 0));
        state.add_ship(Ship::new(1, Coord::new(21, 10), 0, 1).with_speed(2));
        state.add_ship(Ship::new(2, Coord::new(15, 2), 0, 1));

        let shooter = state.ship(0).unwrap();
        // Nearest enemy would sail off the east edge: aim at where it is now
        assert_eq!(intercept_point(&state, shooter), Some(Coord::new(21, 10)));

        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(5, 5), 0, 0));
        state.add_ship(Ship::new(1, Coord::new(9, 5), 2, 1));
        let shooter = state.ship(0).unwrap();
        assert_eq!(intercept_point(&state, shooter), Some(Coord::new(9, 5)));
    }

    #[test]
    fn test_fire_without_enemy_waits() {
        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(5, 5), 0, 0));
        let ship = state.ship(0).unwrap();
        assert_eq!(to_command(&state, ship, ActionCode::Fire), Command::Wait);
    }

    #[test]
    fn test_rollout_does_not_touch_root() {
        let state = duel(100);
        let plan = Plan::uniform(5, 1, ActionCode::Faster);
        let result = evaluate_plan(&state, 0, &plan_slots(&state, 0), &plan, &Heuristics::default());

        assert_eq!(result.rounds_played, 5);
        assert_eq!(state.ship(0).unwrap().speed, 0);
        assert_eq!(state.ship(0).unwrap().position, Coord::new(4, 10));
        assert_eq!(state.round, 0);
    }

    #[test]
    fn test_death_in_rollout_costs_a_ship() {
        // Three rounds of rum left: the ship sinks in round 3 of 5
        let state = duel(3);
        let plan = Plan::uniform(5, 1, ActionCode::Wait);
        let result = evaluate_plan(&state, 0, &plan_slots(&state, 0), &plan, &Heuristics::default());

        assert_eq!(result.rounds_played, 3);
        // -10000 for the ship, -30 for our rum, +3 for the enemy's decay
        assert_eq!(result.score, -10_000 - 30 + 3);
    }

    #[test]
    fn test_moving_plan_beats_idle_plan() {
        let state = duel(100);
        let slots = plan_slots(&state, 0);
        let h = Heuristics::default();

        let idle = evaluate_plan(&state, 0, &slots, &Plan::uniform(5, 1, ActionCode::Wait), &h);
        let mut sail = Plan::uniform(5, 1, ActionCode::Wait);
        sail.set(0, 0, ActionCode::Starboard);
        sail.set(1, 0, ActionCode::Faster);
        sail.set(2, 0, ActionCode::Faster);
        let sail = evaluate_plan(&state, 0, &slots, &sail, &h);

        assert!(sail.score > idle.score);
    }
}
