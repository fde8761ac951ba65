//! Engine state and round resolution

use rustc_hash::FxHashMap;

use crate::action::{Action, ActionParseError, Command, CommandLine};
use crate::entities::{
    Cannonball, Damage, Entity, EntityId, Mine, PlayerId, RumBarrel, Ship,
};
use crate::hex::{Coord, MAP_HEIGHT, MAP_WIDTH};
use crate::protocol::Observation;
use crate::ruleset::{
    RuleSet, COOLDOWN_CANNON, COOLDOWN_MINE, FIRE_DISTANCE_MAX, HIGH_DAMAGE, LOW_DAMAGE,
    MAX_ROUNDS, MINE_DAMAGE, NEAR_MINE_DAMAGE, REWARD_RUM_BARREL_VALUE,
};
use crate::steering;

/// Number of players in a game
pub const PLAYER_COUNT: usize = 2;

pub fn opponent(player: PlayerId) -> PlayerId {
    1 - player
}

// ============================================================================
// CORE TYPES
// ============================================================================

/// A player's ships: everything it ever had, and what is still afloat
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fleet {
    pub id: PlayerId,
    roster: Vec<EntityId>,
    alive: Vec<EntityId>,
}

impl Fleet {
    pub fn new(id: PlayerId) -> Self {
        Self { id, roster: Vec::new(), alive: Vec::new() }
    }

    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    /// Alive ship ids, in roster order
    pub fn alive(&self) -> &[EntityId] {
        &self.alive
    }

    pub fn is_defeated(&self) -> bool {
        self.alive.is_empty()
    }
}

/// Health each player requested through heals and damage since the last reset.
/// Amounts are recorded before clamping, so a heal at full health still counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthLedger {
    gained: [i32; PLAYER_COUNT],
}

impl HealthLedger {
    pub fn gained(&self, player: PlayerId) -> i32 {
        self.gained[player]
    }

    fn record(&mut self, player: PlayerId, delta: i32) {
        self.gained[player] += delta;
    }
}

/// Outcome of resolving a round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    Continue,
    GameOver,
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    Ongoing,
    Winner(PlayerId),
    Draw,
}

/// Cells a ship will cover once the current maneuver is applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Footprint {
    bow: Coord,
    center: Coord,
    stern: Coord,
}

impl Footprint {
    fn at(center: Coord, orientation: u8) -> Self {
        let [bow, center, stern] = Ship::footprint_at(center, orientation);
        Self { bow, center, stern }
    }

    fn of(ship: &Ship) -> Self {
        Self::at(ship.position, ship.orientation)
    }

    fn contains(&self, coord: Coord) -> bool {
        self.bow == coord || self.center == coord || self.stern == coord
    }

    /// Our bow runs into any part of `other`
    fn bow_hits(&self, other: &Footprint) -> bool {
        other.contains(self.bow)
    }

    /// Any of our cells shares a cell with `other`
    fn overlaps(&self, other: &Footprint) -> bool {
        other.contains(self.bow) || other.contains(self.center) || other.contains(self.stern)
    }
}

/// Scratch state for one round's maneuvers, keyed by ship id
type Plans = FxHashMap<EntityId, Footprint>;

// ============================================================================
// ENGINE STATE
// ============================================================================

/// Authoritative game state. Use [`EngineState::snapshot`] to fork it.
#[derive(Debug)]
pub struct EngineState {
    rules: RuleSet,
    players: [Fleet; PLAYER_COUNT],
    /// Ships still in play, grouped by owner in roster order
    ships: Vec<Ship>,
    cannonballs: Vec<Cannonball>,
    mines: Vec<Mine>,
    barrels: Vec<RumBarrel>,
    /// Impacts of the last resolved round
    damage: Vec<Damage>,
    /// Ships sunk in the last resolved round
    ships_lost: Vec<EntityId>,
    /// Cannonball landing cells for the round being resolved
    explosions: Vec<Coord>,
    ledger: HealthLedger,
    next_entity_id: EntityId,
    /// Rounds resolved so far
    pub round: u32,
}

impl Clone for EngineState {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

impl EngineState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty map under the given rules
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            players: [Fleet::new(0), Fleet::new(1)],
            ships: Vec::new(),
            cannonballs: Vec::new(),
            mines: Vec::new(),
            barrels: Vec::new(),
            damage: Vec::new(),
            ships_lost: Vec::new(),
            explosions: Vec::new(),
            ledger: HealthLedger::default(),
            next_entity_id: 0,
            round: 0,
        }
    }

    /// Build a state from observed entities. Ship owners must already be
    /// absolute player indices.
    pub fn from_entities(rules: RuleSet, entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut state = Self::new(rules);
        for entity in entities {
            match entity {
                Entity::Ship(ship) => state.add_ship(ship),
                Entity::Cannonball(ball) => {
                    state.bump_next_id(ball.id);
                    state.cannonballs.push(ball);
                }
                Entity::Mine(mine) => {
                    state.bump_next_id(mine.id);
                    state.mines.push(mine);
                }
                Entity::Barrel(barrel) => {
                    state.bump_next_id(barrel.id);
                    state.barrels.push(barrel);
                }
            }
        }
        state
    }

    /// Seeded mirror-symmetric starting position
    pub fn generate(rules: RuleSet, seed: u64) -> Self {
        rules.generate_state(seed)
    }

    /// State as seen by `me` from one round of protocol input
    pub fn from_observation(rules: RuleSet, me: PlayerId, observation: Observation) -> Self {
        let entities = observation.records.into_iter().map(|r| r.into_entity(me));
        Self::from_entities(rules, entities)
    }

    /// Exact, independent deep copy of every container and counter
    pub fn snapshot(&self) -> Self {
        let Self {
            rules,
            players,
            ships,
            cannonballs,
            mines,
            barrels,
            damage,
            ships_lost,
            explosions,
            ledger,
            next_entity_id,
            round,
        } = self;

        Self {
            rules: *rules,
            players: [players[0].clone(), players[1].clone()],
            ships: ships.clone(),
            cannonballs: cannonballs.clone(),
            mines: mines.clone(),
            barrels: barrels.clone(),
            damage: damage.clone(),
            ships_lost: ships_lost.clone(),
            explosions: explosions.clone(),
            ledger: *ledger,
            next_entity_id: *next_entity_id,
            round: *round,
        }
    }

    /// Overwrite this state with a deep copy of `source`
    pub fn restore(&mut self, source: &EngineState) {
        *self = source.snapshot();
    }

    // ========================================================================
    // POPULATION
    // ========================================================================

    fn bump_next_id(&mut self, id: EntityId) {
        self.next_entity_id = self.next_entity_id.max(id + 1);
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Add a ship to its owner's roster and to the alive set
    pub fn add_ship(&mut self, ship: Ship) {
        self.bump_next_id(ship.id);
        let fleet = &mut self.players[ship.owner];
        fleet.roster.push(ship.id);
        fleet.alive.push(ship.id);

        let slot = self
            .ships
            .iter()
            .rposition(|s| s.owner <= ship.owner)
            .map_or(0, |i| i + 1);
        self.ships.insert(slot, ship);
    }

    /// Place a new mine, returning its id
    pub fn add_mine(&mut self, position: Coord) -> EntityId {
        let id = self.allocate_id();
        self.mines.push(Mine { id, position });
        id
    }

    /// Place a new rum barrel, returning its id
    pub fn add_barrel(&mut self, position: Coord, rum: i32) -> EntityId {
        let id = self.allocate_id();
        self.barrels.push(RumBarrel { id, position, rum });
        id
    }

    /// Launch a cannonball from `source` landing on `target` after `turns` rounds
    pub fn add_cannonball(
        &mut self,
        owner_ship: EntityId,
        source: Coord,
        target: Coord,
        turns: i32,
    ) -> EntityId {
        let id = self.allocate_id();
        self.cannonballs.push(Cannonball {
            id,
            position: target,
            owner_ship,
            source,
            initial_turns: turns,
            remaining_turns: turns,
        });
        id
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn fleet(&self, player: PlayerId) -> &Fleet {
        &self.players[player]
    }

    /// Ships still in play, both players
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    fn ship_index(&self, id: EntityId) -> Option<usize> {
        self.ships.iter().position(|s| s.id == id)
    }

    /// A player's alive ships in roster order
    pub fn alive_ships(&self, player: PlayerId) -> impl Iterator<Item = &Ship> + '_ {
        self.players[player].alive.iter().map(move |&id| {
            self.ship(id)
                .expect("alive ship missing from the ship list")
        })
    }

    pub fn alive_count(&self, player: PlayerId) -> usize {
        self.players[player].alive.len()
    }

    pub fn cannonballs(&self) -> &[Cannonball] {
        &self.cannonballs
    }

    pub fn mines(&self) -> &[Mine] {
        &self.mines
    }

    pub fn barrels(&self) -> &[RumBarrel] {
        &self.barrels
    }

    /// Impacts recorded during the last resolved round
    pub fn damage(&self) -> &[Damage] {
        &self.damage
    }

    /// Ships sunk during the last resolved round
    pub fn ships_lost(&self) -> &[EntityId] {
        &self.ships_lost
    }

    pub fn ledger(&self) -> &HealthLedger {
        &self.ledger
    }

    pub fn reset_ledger(&mut self) {
        self.ledger = HealthLedger::default();
    }

    /// Total rum of a player's remaining ships
    pub fn score(&self, player: PlayerId) -> i32 {
        self.alive_ships(player).map(|s| s.health).sum()
    }

    /// Nearest alive enemy ship to `ship_id`, first found on ties
    pub fn nearest_enemy(&self, ship_id: EntityId) -> Option<&Ship> {
        let ship = self.ship(ship_id)?;
        let mut best: Option<(&Ship, i32)> = None;
        for enemy in self.alive_ships(opponent(ship.owner)) {
            let distance = ship.position.distance_to(enemy.position);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((enemy, distance));
            }
        }
        best.map(|(enemy, _)| enemy)
    }

    /// Nearest barrel to `from`, first found on ties
    pub fn nearest_barrel(&self, from: Coord) -> Option<&RumBarrel> {
        let mut best: Option<(&RumBarrel, i32)> = None;
        for barrel in &self.barrels {
            let distance = from.distance_to(barrel.position);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((barrel, distance));
            }
        }
        best.map(|(barrel, _)| barrel)
    }

    /// Game result at the current state
    pub fn result(&self) -> GameResult {
        let defeated = [self.players[0].is_defeated(), self.players[1].is_defeated()];
        match defeated {
            [true, true] => return GameResult::Draw,
            [true, false] => return GameResult::Winner(1),
            [false, true] => return GameResult::Winner(0),
            [false, false] => {}
        }

        let out_of_barrels = self.rules.ends_without_barrels() && self.barrels.is_empty();
        if self.round >= MAX_ROUNDS || out_of_barrels {
            let (s0, s1) = (self.score(0), self.score(1));
            return match s0.cmp(&s1) {
                std::cmp::Ordering::Greater => GameResult::Winner(0),
                std::cmp::Ordering::Less => GameResult::Winner(1),
                std::cmp::Ordering::Equal => GameResult::Draw,
            };
        }

        GameResult::Ongoing
    }

    // ========================================================================
    // ORDERS
    // ========================================================================

    /// Clear per-round state before collecting orders
    pub fn begin_round(&mut self) {
        for ship in &mut self.ships {
            ship.action = None;
            ship.message = None;
        }
        self.explosions.clear();
        self.damage.clear();
        self.ships_lost.clear();
    }

    /// Apply one command to a ship. MINE and FIRE only register when the
    /// rules enable them.
    pub fn apply_command(&mut self, ship_id: EntityId, line: &CommandLine) {
        let rules = self.rules;
        let idx = self
            .ship_index(ship_id)
            .expect("command for a ship that is not in play");
        let ship = &mut self.ships[idx];

        ship.set_message(line.message.as_deref());
        match line.command {
            Command::Move(target) => ship.action = steering::move_to(ship, target),
            Command::Faster => ship.action = Some(Action::Faster),
            Command::Slower => ship.action = Some(Action::Slower),
            Command::Port => ship.action = Some(Action::Port),
            Command::Starboard => ship.action = Some(Action::Starboard),
            Command::Wait => {}
            Command::Mine => {
                if rules.mines_enabled {
                    ship.action = Some(Action::Mine);
                }
            }
            Command::Fire(target) => {
                if rules.cannons_enabled {
                    ship.target = Some(target);
                    ship.action = Some(Action::Fire);
                }
            }
        }
    }

    /// Apply a player's output lines to its alive ships, in order.
    ///
    /// A malformed line, or more lines than ships, sinks the whole fleet.
    pub fn apply_player_output<S: AsRef<str>>(
        &mut self,
        player: PlayerId,
        lines: &[S],
    ) -> Result<(), ActionParseError> {
        let alive = self.players[player].alive.clone();
        if lines.len() > alive.len() {
            self.set_dead(player);
            return Err(ActionParseError::TooManyLines {
                given: lines.len(),
                expected: alive.len(),
            });
        }

        for (&ship_id, line) in alive.iter().zip(lines) {
            match Command::parse_line(line.as_ref()) {
                Ok(command) => self.apply_command(ship_id, &command),
                Err(e) => {
                    tracing::warn!("player {} sent an invalid action: {}", player, e);
                    self.set_dead(player);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Eliminate a player: every ship's rum drops to zero
    pub fn set_dead(&mut self, player: PlayerId) {
        for ship in self.ships.iter_mut().filter(|s| s.owner == player) {
            ship.health = 0;
        }
    }

    // ========================================================================
    // ROUND RESOLUTION
    // ========================================================================

    /// Advance the state by one round using each ship's pending action
    pub fn resolve_round(&mut self) -> RoundStatus {
        self.move_cannonballs();
        self.decrement_rum();

        let mut headings = self.apply_actions();
        self.move_ships();
        self.rotate_ships(&mut headings);

        self.explode_cannonballs();
        self.spawn_rewards();
        self.remove_sunk_ships();
        self.round += 1;

        if self.is_game_over() {
            RoundStatus::GameOver
        } else {
            RoundStatus::Continue
        }
    }

    fn is_game_over(&self) -> bool {
        self.players.iter().any(Fleet::is_defeated)
            || self.rules.ends_without_barrels() && self.barrels.is_empty()
    }

    fn damage_ship(&mut self, idx: usize, amount: i32) {
        let ship = &mut self.ships[idx];
        let amount = ship.damage(amount);
        self.ledger.record(ship.owner, -amount);
    }

    fn heal_ship(&mut self, idx: usize, amount: i32) {
        let ship = &mut self.ships[idx];
        let amount = ship.heal(amount);
        self.ledger.record(ship.owner, amount);
    }

    fn mark_lost(&mut self, id: EntityId) {
        if !self.ships_lost.contains(&id) {
            self.ships_lost.push(id);
        }
    }

    /// Phase 1: count down cannonballs; the ones reaching zero explode
    fn move_cannonballs(&mut self) {
        let explosions = &mut self.explosions;
        self.cannonballs.retain_mut(|ball| {
            if ball.remaining_turns <= 0 {
                return false;
            }
            ball.remaining_turns -= 1;
            if ball.remaining_turns == 0 {
                explosions.push(ball.position);
                return false;
            }
            true
        });
    }

    /// Phase 2: every ship burns one unit of rum
    fn decrement_rum(&mut self) {
        for idx in 0..self.ships.len() {
            self.damage_ship(idx, 1);
        }
    }

    /// Phase 3: cooldowns, speed changes, mines and shots. Returns the
    /// heading each ship wants after rotation.
    fn apply_actions(&mut self) -> FxHashMap<EntityId, u8> {
        let max_speed = self.rules.max_ship_speed;
        let mut headings = FxHashMap::default();

        for idx in 0..self.ships.len() {
            let ship = &mut self.ships[idx];
            if ship.mine_cooldown > 0 {
                ship.mine_cooldown -= 1;
            }
            if ship.cannon_cooldown > 0 {
                ship.cannon_cooldown -= 1;
            }

            let id = ship.id;
            let orientation = ship.orientation;
            let mut heading = orientation;
            match ship.action {
                Some(Action::Faster) if ship.speed < max_speed => ship.speed += 1,
                Some(Action::Slower) if ship.speed > 0 => ship.speed -= 1,
                Some(Action::Port) => heading = (orientation + 1) % 6,
                Some(Action::Starboard) => heading = (orientation + 5) % 6,
                Some(Action::Mine) => self.lay_mine(idx),
                Some(Action::Fire) => self.fire_cannon(idx),
                _ => {}
            }
            headings.insert(id, heading);
        }

        headings
    }

    /// Drop a mine two cells behind the stern if the cell is clear
    fn lay_mine(&mut self, idx: usize) {
        let ship = &self.ships[idx];
        if ship.mine_cooldown != 0 {
            return;
        }

        let target = ship.stern().neighbor((ship.orientation + 3) % 6);
        if !target.is_inside_map() {
            return;
        }
        let free_of_barrels = self.barrels.iter().all(|b| b.position != target);
        let free_of_ships = self
            .ships
            .iter()
            .enumerate()
            .all(|(i, other)| i == idx || !other.at(target));

        if free_of_barrels && free_of_ships {
            self.ships[idx].mine_cooldown = COOLDOWN_MINE;
            self.add_mine(target);
        }
    }

    /// Fire from the bow at the ship's target if in range and reloaded
    fn fire_cannon(&mut self, idx: usize) {
        let ship = &self.ships[idx];
        let Some(target) = ship.target else {
            return;
        };

        let bow = ship.bow();
        let distance = bow.distance_to(target);
        if target.is_inside_map() && distance <= FIRE_DISTANCE_MAX && ship.cannon_cooldown == 0 {
            let travel_time = 1 + (distance as f64 / 3.0).round() as i32;
            let owner_ship = ship.id;
            self.ships[idx].cannon_cooldown = COOLDOWN_CANNON;
            self.add_cannonball(owner_ship, bow, target, travel_time);
        }
    }

    /// Phase 4: advance ships one cell per sub-step, undoing colliding moves
    fn move_ships(&mut self) {
        for step in 1..=self.rules.max_ship_speed {
            let mut plans = Plans::default();
            for ship in &mut self.ships {
                let mut plan = Footprint::of(ship);
                if step <= ship.speed {
                    let next = ship.position.neighbor(ship.orientation);
                    if next.is_inside_map() {
                        plan = Footprint::at(next, ship.orientation);
                    } else {
                        ship.speed = 0;
                    }
                }
                plans.insert(ship.id, plan);
            }

            self.settle_collisions(&mut plans, Footprint::bow_hits);

            for idx in 0..self.ships.len() {
                if self.ships[idx].health == 0 {
                    continue;
                }
                let id = self.ships[idx].id;
                self.ships[idx].position = plans[&id].center;
                if self.check_contacts(idx) {
                    self.mark_lost(id);
                }
            }
        }
    }

    /// Phase 5: turn ships toward their new heading unless the turn collides
    fn rotate_ships(&mut self, headings: &mut FxHashMap<EntityId, u8>) {
        let mut plans = Plans::default();
        for ship in &self.ships {
            let heading = headings.get(&ship.id).copied().unwrap_or(ship.orientation);
            plans.insert(ship.id, Footprint::at(ship.position, heading));
        }

        for id in self.settle_collisions(&mut plans, Footprint::overlaps) {
            if let Some(ship) = self.ship(id) {
                headings.insert(id, ship.orientation);
            }
        }

        for idx in 0..self.ships.len() {
            if self.ships[idx].health == 0 {
                continue;
            }
            let id = self.ships[idx].id;
            if let Some(&heading) = headings.get(&id) {
                self.ships[idx].orientation = heading;
            }
            if self.check_contacts(idx) {
                self.mark_lost(id);
            }
        }
    }

    /// Revert every colliding plan to the ship's current footprint and stop
    /// the ship, until no new reverts happen. Returns the ships reverted.
    fn settle_collisions(
        &mut self,
        plans: &mut Plans,
        collides: fn(&Footprint, &Footprint) -> bool,
    ) -> Vec<EntityId> {
        let mut reverted = Vec::new();
        loop {
            let colliding: Vec<usize> = (0..self.ships.len())
                .filter(|&i| {
                    let mine = &plans[&self.ships[i].id];
                    self.ships
                        .iter()
                        .enumerate()
                        .any(|(j, other)| j != i && collides(mine, &plans[&other.id]))
                })
                .collect();

            let mut changed = false;
            for idx in colliding {
                let ship = &mut self.ships[idx];
                ship.speed = 0;
                let current = Footprint::of(ship);
                if plans[&ship.id] != current {
                    plans.insert(ship.id, current);
                    changed = true;
                }
                if !reverted.contains(&ship.id) {
                    reverted.push(ship.id);
                }
            }

            if !changed {
                return reverted;
            }
        }
    }

    /// Pick up barrels under the ship and set off any mine touched by any
    /// ship. Returns true if the ship has sunk.
    fn check_contacts(&mut self, idx: usize) -> bool {
        let footprint = Footprint::of(&self.ships[idx]);

        let mut k = 0;
        while k < self.barrels.len() {
            if footprint.contains(self.barrels[k].position) {
                let barrel = self.barrels.remove(k);
                self.heal_ship(idx, barrel.rum);
            } else {
                k += 1;
            }
        }

        let mut k = 0;
        while k < self.mines.len() {
            let impacts = self.explode_mine(self.mines[k].position, false);
            if impacts.is_empty() {
                k += 1;
            } else {
                self.damage.extend(impacts);
                self.mines.remove(k);
            }
        }

        self.ships[idx].is_sunk()
    }

    /// Detonate a mine at `position`. Ships touching the cell take full
    /// damage; every other ship with a cell within 1 takes splash damage.
    /// Without `force` nothing happens unless a ship touches the mine.
    fn explode_mine(&mut self, position: Coord, force: bool) -> Vec<Damage> {
        let mut impacts = Vec::new();
        let mut victim = None;

        for idx in 0..self.ships.len() {
            if self.ships[idx].at(position) {
                impacts.push(Damage::hit(position, MINE_DAMAGE));
                self.damage_ship(idx, MINE_DAMAGE);
                victim = Some(idx);
            }
        }

        if !force && victim.is_none() {
            return impacts;
        }
        if victim.is_none() {
            impacts.push(Damage::hit(position, MINE_DAMAGE));
        }

        for idx in 0..self.ships.len() {
            if Some(idx) == victim {
                continue;
            }
            let ship = &self.ships[idx];
            // Center beats bow beats stern as the reported impact cell
            let impact = [ship.position, ship.bow(), ship.stern()]
                .into_iter()
                .find(|cell| cell.distance_to(position) <= 1);
            if let Some(cell) = impact {
                self.damage_ship(idx, NEAR_MINE_DAMAGE);
                impacts.push(Damage::hit(cell, NEAR_MINE_DAMAGE));
            }
        }

        impacts
    }

    /// Phase 6: each landing cannonball hits at most one thing
    fn explode_cannonballs(&mut self) {
        let explosions = std::mem::take(&mut self.explosions);

        for &position in &explosions {
            let ship_hit = self.ships.iter().position(|s| s.at(position));
            if let Some(idx) = ship_hit {
                let ship = &self.ships[idx];
                let amount = if ship.bow() == position || ship.stern() == position {
                    LOW_DAMAGE
                } else {
                    HIGH_DAMAGE
                };
                self.damage.push(Damage::hit(position, amount));
                self.damage_ship(idx, amount);
            } else if let Some(k) = self.mines.iter().position(|m| m.position == position) {
                self.mines.remove(k);
                let impacts = self.explode_mine(position, true);
                self.damage.extend(impacts);
            } else if let Some(k) = self.barrels.iter().position(|b| b.position == position) {
                self.barrels.remove(k);
                self.damage.push(Damage::hit(position, 0));
            } else {
                self.damage.push(Damage::splash(position));
            }
        }

        self.explosions = explosions;
    }

    /// Phase 7: every sunk ship leaves a reward barrel where it went down
    fn spawn_rewards(&mut self) {
        let sunk: Vec<EntityId> = self
            .ships
            .iter()
            .filter(|s| s.is_sunk())
            .map(|s| s.id)
            .collect();
        for id in sunk {
            self.mark_lost(id);
        }

        for id in self.ships_lost.clone() {
            if let Some(position) = self.ship(id).map(|s| s.position) {
                self.add_barrel(position, REWARD_RUM_BARREL_VALUE);
            }
        }
    }

    /// Phase 8: sunk ships leave play and their owner's alive set
    fn remove_sunk_ships(&mut self) {
        let players = &mut self.players;
        self.ships.retain(|ship| {
            if ship.is_sunk() {
                players[ship.owner].alive.retain(|&id| id != ship.id);
                false
            } else {
                true
            }
        });
    }

    // ========================================================================
    // DEBUG
    // ========================================================================

    /// Text map: M mines, S ships, R barrels, C cannonball targets
    pub fn ascii_map(&self) -> String {
        let mut grid = vec![vec!['.'; MAP_WIDTH as usize]; MAP_HEIGHT as usize];
        let mut mark = |coord: Coord, c: char| {
            if coord.is_inside_map() {
                grid[coord.y as usize][coord.x as usize] = c;
            }
        };

        for mine in &self.mines {
            mark(mine.position, 'M');
        }
        for ship in &self.ships {
            mark(ship.position, 'S');
        }
        for barrel in &self.barrels {
            mark(barrel.position, 'R');
        }
        for ball in &self.cannonballs {
            mark(ball.position, 'C');
        }

        grid.into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// TESTS
// ============================================================================
