//! Position evaluation for rollouts

use serde::{Deserialize, Serialize};

use crate::engine::{opponent, EngineState};
use crate::entities::PlayerId;

/// Weights for scoring a rollout's end state against its start
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Per own ship lost during the rollout
    pub ship_lost: i32,
    /// Per own ship that ended within `stall_radius` of where it started
    pub stalled: i32,
    pub stall_radius: i32,
    /// Per unit of net health we gained
    pub own_health: i32,
    /// Per unit of net health the opponent gained
    pub enemy_health: i32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            ship_lost: -10_000,
            stalled: -500,
            stall_radius: 3,
            own_health: 10,
            enemy_health: -1,
        }
    }
}

/// Score `after` from `me`'s side, relative to the rollout start `before`.
///
/// The health terms read `after`'s ledger, so the rollout copy must have had
/// its ledger reset before the first simulated round.
pub fn evaluate(before: &EngineState, after: &EngineState, me: PlayerId, h: &Heuristics) -> i32 {
    let lost = before.alive_count(me).saturating_sub(after.alive_count(me)) as i32;
    let mut score = h.ship_lost * lost;

    for ship in before.alive_ships(me) {
        if let Some(now) = after.ship(ship.id) {
            if ship.position.distance_to(now.position) <= h.stall_radius {
                score += h.stalled;
            }
        }
    }

    score += h.own_health * after.ledger().gained(me);
    score += h.enemy_health * after.ledger().gained(opponent(me));
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Command, CommandLine};
    use crate::entities::Ship;
    use crate::hex::Coord;
    use crate::ruleset::RuleSet;

    fn start() -> EngineState {
        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(3, 10), 0, 0));
        state.add_ship(Ship::new(1, Coord::new(18, 4), 3, 1));
        state
    }

    fn rollout(before: &EngineState, rounds: usize, command: Command) -> EngineState {
        let mut after = before.snapshot();
        after.reset_ledger();
        for _ in 0..rounds {
            after.begin_round();
            after.apply_command(0, &CommandLine::new(command));
            after.resolve_round();
        }
        after
    }

    #[test]
    fn test_idle_ship_is_penalized() {
        let before = start();
        let after = rollout(&before, 2, Command::Wait);
        // Two rounds of decay on each side, and we did not move
        assert_eq!(evaluate(&before, &after, 0, &Heuristics::default()), -500 - 20 + 2);
    }

    #[test]
    fn test_moving_away_avoids_stall_penalty() {
        let before = start();
        let after = rollout(&before, 4, Command::Faster);
        assert!(after.ship(0).unwrap().position.distance_to(Coord::new(3, 10)) > 3);
        assert_eq!(evaluate(&before, &after, 0, &Heuristics::default()), -40 + 4);
    }

    #[test]
    fn test_losing_a_ship_dominates() {
        let before = start();
        let mut after = before.snapshot();
        after.reset_ledger();
        after.set_dead(0);
        after.begin_round();
        after.resolve_round();
        let score = evaluate(&before, &after, 0, &Heuristics::default());
        assert!(score <= -10_000);
    }
}
