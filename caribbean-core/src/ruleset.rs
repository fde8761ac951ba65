//! RuleSet - league tier and fixed game constants

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::EngineState;
use crate::entities::Ship;
use crate::hex::{Coord, MAP_HEIGHT, MAP_WIDTH};

pub const COOLDOWN_CANNON: i32 = 2;
pub const COOLDOWN_MINE: i32 = 5;
pub const INITIAL_SHIP_HEALTH: i32 = 100;
pub const MAX_SHIP_HEALTH: i32 = 100;
pub const MIN_SHIPS: usize = 1;
pub const MIN_RUM_BARRELS: usize = 10;
pub const MAX_RUM_BARRELS: usize = 26;
pub const MIN_RUM_BARREL_VALUE: i32 = 10;
pub const MAX_RUM_BARREL_VALUE: i32 = 20;
pub const REWARD_RUM_BARREL_VALUE: i32 = 30;
pub const MINE_VISIBILITY_RANGE: i32 = 5;
pub const FIRE_DISTANCE_MAX: i32 = 10;
/// Cannonball landing on a bow or stern
pub const LOW_DAMAGE: i32 = 25;
/// Cannonball landing on a ship center
pub const HIGH_DAMAGE: i32 = 50;
pub const MINE_DAMAGE: i32 = 25;
pub const NEAR_MINE_DAMAGE: i32 = 10;
/// Rounds before the game is scored on remaining rum
pub const MAX_ROUNDS: u32 = 200;

/// Rule tier: which features are unlocked and how fast ships go
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub league: u8,
    pub max_ships: usize,
    pub cannons_enabled: bool,
    pub mines_enabled: bool,
    pub min_mines: usize,
    pub max_mines: usize,
    pub max_ship_speed: i32,
}

impl RuleSet {
    /// Rules for a league level; anything above 3 plays as league 3
    pub fn league(level: u8) -> Self {
        match level {
            // 1 ship, no mines, speed 1
            0 => Self {
                league: 0,
                max_ships: 1,
                cannons_enabled: false,
                mines_enabled: false,
                min_mines: 0,
                max_mines: 0,
                max_ship_speed: 1,
            },
            1 => Self {
                league: 1,
                max_ships: 1,
                cannons_enabled: true,
                mines_enabled: true,
                min_mines: 5,
                max_mines: 10,
                max_ship_speed: 1,
            },
            2 => Self {
                league: 2,
                max_ships: 3,
                cannons_enabled: true,
                mines_enabled: true,
                min_mines: 5,
                max_mines: 10,
                max_ship_speed: 1,
            },
            _ => Self {
                league: 3,
                max_ships: 3,
                cannons_enabled: true,
                mines_enabled: true,
                min_mines: 5,
                max_mines: 10,
                max_ship_speed: 2,
            },
        }
    }

    /// The base tier also ends once every barrel is gone
    pub fn ends_without_barrels(&self) -> bool {
        self.league == 0
    }

    /// Random mirror-symmetric starting position for this tier.
    ///
    /// Player 1's ships, mines and barrels mirror player 0's across the
    /// horizontal midline, so the same seed always yields the same map.
    pub fn generate_state(&self, seed: u64) -> EngineState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = EngineState::new(*self);

        let ships_per_player = rng.gen_range(MIN_SHIPS..=self.max_ships.max(MIN_SHIPS));
        let mine_count = if self.max_mines > self.min_mines {
            rng.gen_range(self.min_mines..self.max_mines)
        } else {
            self.min_mines
        };
        let barrel_count = rng.gen_range(MIN_RUM_BARRELS..MAX_RUM_BARRELS);

        // Each ship gets its own vertical band of the top half
        let bands = ships_per_player as i32;
        let mut next_id = 0;
        for j in 0..bands {
            let x_min = 1 + j * MAP_WIDTH / bands;
            let x_max = (j + 1) * MAP_WIDTH / bands - 2;
            let y = 1 + rng.gen_range(0..MAP_HEIGHT / 2 - 2);
            let x = x_min + rng.gen_range(0..=(x_max - x_min).max(0));
            let orientation = rng.gen_range(0..6u8);

            state.add_ship(Ship::new(next_id, Coord::new(x, y), orientation, 0));
            state.add_ship(Ship::new(
                next_id + 1,
                Coord::new(x, MAP_HEIGHT - 1 - y),
                (6 - orientation) % 6,
                1,
            ));
            next_id += 2;
        }

        let occupied = |state: &EngineState, c: Coord| state.ships().iter().any(|s| s.at(c));

        while state.mines().len() < mine_count {
            let cell = random_top_half_cell(&mut rng);
            if occupied(&state, cell) {
                continue;
            }
            let mirror = Coord::new(cell.x, MAP_HEIGHT - 1 - cell.y);
            if mirror != cell {
                state.add_mine(mirror);
            }
            state.add_mine(cell);
        }

        while state.barrels().len() < barrel_count {
            let cell = random_top_half_cell(&mut rng);
            let rum = rng.gen_range(MIN_RUM_BARREL_VALUE..=MAX_RUM_BARREL_VALUE);
            let mined = state.mines().iter().any(|m| m.position == cell);
            if occupied(&state, cell) || mined {
                continue;
            }
            let mirror = Coord::new(cell.x, MAP_HEIGHT - 1 - cell.y);
            if mirror != cell {
                state.add_barrel(mirror, rum);
            }
            state.add_barrel(cell, rum);
        }

        tracing::debug!(
            "generated league {} map: {} ships per player, {} mines, {} barrels",
            self.league,
            ships_per_player,
            state.mines().len(),
            state.barrels().len()
        );
        state
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let rules: RuleSet = serde_json::from_str(&content)?;
        Ok(rules)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::league(3)
    }
}

/// A cell in the upper half of the map, away from the side edges
fn random_top_half_cell<R: Rng>(rng: &mut R) -> Coord {
    let x = 1 + rng.gen_range(0..MAP_WIDTH - 2);
    let y = 1 + rng.gen_range(0..MAP_HEIGHT / 2);
    Coord::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_progression() {
        assert!(!RuleSet::league(0).cannons_enabled);
        assert!(RuleSet::league(1).mines_enabled);
        assert_eq!(RuleSet::league(2).max_ships, 3);
        assert_eq!(RuleSet::league(3).max_ship_speed, 2);
        assert_eq!(RuleSet::league(9), RuleSet::league(3));
        assert_eq!(RuleSet::default().league, 3);
    }

    #[test]
    fn test_only_base_tier_ends_on_barrels() {
        assert!(RuleSet::league(0).ends_without_barrels());
        assert!(!RuleSet::default().ends_without_barrels());
    }

    #[test]
    fn test_json_roundtrip() {
        let rules = RuleSet::league(1);
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(rules, back);
    }

    #[test]
    fn test_generated_map_is_mirrored() {
        for seed in 0..20 {
            let rules = RuleSet::default();
            let state = rules.generate_state(seed);

            let fleet0: Vec<_> = state.alive_ships(0).collect();
            let fleet1: Vec<_> = state.alive_ships(1).collect();
            assert_eq!(fleet0.len(), fleet1.len());
            assert!((MIN_SHIPS..=rules.max_ships).contains(&fleet0.len()));
            for (a, b) in fleet0.iter().zip(&fleet1) {
                assert_eq!(b.position, Coord::new(a.position.x, MAP_HEIGHT - 1 - a.position.y));
                assert_eq!(b.orientation, (6 - a.orientation) % 6);
                assert!(a.position.is_inside_map());
            }

            assert!(state.mines().len() >= rules.min_mines);
            for mine in state.mines() {
                let mirror = Coord::new(mine.position.x, MAP_HEIGHT - 1 - mine.position.y);
                assert!(state.mines().iter().any(|m| m.position == mirror));
                assert!(!state.ships().iter().any(|s| s.at(mine.position)));
            }

            assert!(state.barrels().len() >= MIN_RUM_BARRELS);
            for barrel in state.barrels() {
                assert!((MIN_RUM_BARREL_VALUE..=MAX_RUM_BARREL_VALUE).contains(&barrel.rum));
                assert!(!state.mines().iter().any(|m| m.position == barrel.position));
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let rules = RuleSet::league(2);
        let a = rules.generate_state(42);
        let b = rules.generate_state(42);
        assert_eq!(a.ships(), b.ships());
        assert_eq!(a.mines(), b.mines());
        assert_eq!(a.barrels(), b.barrels());
    }

    #[test]
    fn test_base_tier_has_no_mines() {
        let state = RuleSet::league(0).generate_state(7);
        assert!(state.mines().is_empty());
        assert_eq!(state.alive_count(0), 1);
    }
}
