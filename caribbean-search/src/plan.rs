//! Candidate plans: one action code per own ship per lookahead round

use rand::Rng;

/// Size of the per-ship action alphabet
pub const ACTION_CODE_COUNT: usize = 7;

/// Per-ship action a plan can assign for one round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionCode {
    /// Fire at the predicted position of the nearest enemy
    Fire,
    Mine,
    Port,
    Starboard,
    Faster,
    Slower,
    Wait,
}

impl ActionCode {
    pub const ALL: [ActionCode; ACTION_CODE_COUNT] = [
        ActionCode::Fire,
        ActionCode::Mine,
        ActionCode::Port,
        ActionCode::Starboard,
        ActionCode::Faster,
        ActionCode::Slower,
        ActionCode::Wait,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..ACTION_CODE_COUNT)]
    }
}

/// Action codes for every (round, ship slot) of the horizon
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    horizon: usize,
    ships: usize,
    /// Row-major by round
    codes: Vec<ActionCode>,
}

impl Plan {
    /// Uniformly random plan
    pub fn random<R: Rng>(horizon: usize, ships: usize, rng: &mut R) -> Self {
        let codes = (0..horizon * ships).map(|_| ActionCode::random(rng)).collect();
        Self { horizon, ships, codes }
    }

    /// Plan with the same code in every slot
    pub fn uniform(horizon: usize, ships: usize, code: ActionCode) -> Self {
        Self {
            horizon,
            ships,
            codes: vec![code; horizon * ships],
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn ships(&self) -> usize {
        self.ships
    }

    pub fn get(&self, round: usize, ship: usize) -> ActionCode {
        self.codes[round * self.ships + ship]
    }

    pub fn set(&mut self, round: usize, ship: usize, code: ActionCode) {
        self.codes[round * self.ships + ship] = code;
    }

    /// Codes for the first round, one per ship slot
    pub fn first_round(&self) -> &[ActionCode] {
        let end = self.ships.min(self.codes.len());
        &self.codes[..end]
    }

    /// Copy with exactly one random slot changed to a different code.
    /// An empty plan has no slot to change and is returned as is.
    pub fn mutation<R: Rng>(&self, rng: &mut R) -> Self {
        let mut mutated = self.clone();
        if mutated.codes.is_empty() {
            return mutated;
        }

        let slot = rng.gen_range(0..mutated.codes.len());
        let current = mutated.codes[slot];
        let mut code = ActionCode::random(rng);
        while code == current {
            code = ActionCode::random(rng);
        }
        mutated.codes[slot] = code;
        mutated
    }
}
