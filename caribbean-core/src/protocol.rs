//! Line protocol between the referee and a bot
//!
//! Each round the bot reads its own ship count, the entity count, then one
//! record per entity:
//!
//! ```text
//! id TYPE x y arg1 arg2 arg3 arg4
//! ```
//!
//! | TYPE       | arg1             | arg2            | arg3   | arg4                |
//! |------------|------------------|-----------------|--------|---------------------|
//! | SHIP       | orientation      | speed           | rum    | 1 if ours, 0 if not |
//! | BARREL     | rum              | 0               | 0      | 0                   |
//! | CANNONBALL | firing ship id   | turns to impact | 0      | 0                   |
//! | MINE       | 0                | 0               | 0      | 0                   |
//!
//! The bot answers with one command line per own ship, in input order.

use std::io::{self, BufRead, Write};

use crate::action::CommandLine;
use crate::engine::{opponent, EngineState};
use crate::entities::{Cannonball, Entity, EntityId, EntityType, Mine, PlayerId, RumBarrel, Ship};
use crate::hex::Coord;
use crate::ruleset::{RuleSet, MINE_VISIBILITY_RANGE};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("input ended while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("bad count line: {0:?}")]
    BadCount(String),

    #[error("bad entity record {line:?}: {reason}")]
    BadRecord { line: String, reason: String },
}

/// One entity line as sent to a bot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityType,
    pub position: Coord,
    pub args: [i32; 4],
}

impl EntityRecord {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let bad = |reason: &str| ProtocolError::BadRecord {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 8 {
            return Err(bad("expected 8 fields"));
        }

        let kind: EntityType = tokens[1]
            .parse()
            .map_err(|t| bad(&format!("unknown entity type {}", t)))?;
        let field = |i: usize| -> Result<i32, ProtocolError> {
            tokens[i].parse().map_err(|_| bad("non-numeric field"))
        };
        let id = field(0)?;
        let position = Coord::new(field(2)?, field(3)?);
        let args = [field(4)?, field(5)?, field(6)?, field(7)?];

        if kind == EntityType::Ship && !(0..6).contains(&args[0]) {
            return Err(bad("ship orientation out of range"));
        }

        Ok(Self { id, kind, position, args })
    }

    /// Record for an entity as seen by `viewer`
    pub fn of(entity: &Entity, viewer: PlayerId) -> Self {
        let args = match entity {
            Entity::Ship(s) => [
                s.orientation as i32,
                s.speed,
                s.health,
                (s.owner == viewer) as i32,
            ],
            Entity::Barrel(b) => [b.rum, 0, 0, 0],
            Entity::Cannonball(c) => [c.owner_ship, c.remaining_turns, 0, 0],
            Entity::Mine(_) => [0; 4],
        };
        Self {
            id: entity.id(),
            kind: entity.entity_type(),
            position: entity.position(),
            args,
        }
    }

    /// Rebuild the entity; ships flagged as ours belong to `me`.
    /// A cannonball's launch cell is not observable and is set to its target.
    pub fn into_entity(self, me: PlayerId) -> Entity {
        let [a1, a2, a3, a4] = self.args;
        match self.kind {
            EntityType::Ship => {
                let owner = if a4 == 1 { me } else { opponent(me) };
                let ship = Ship::new(self.id, self.position, a1 as u8, owner)
                    .with_speed(a2)
                    .with_health(a3);
                Entity::Ship(ship)
            }
            EntityType::Barrel => Entity::Barrel(RumBarrel {
                id: self.id,
                position: self.position,
                rum: a1,
            }),
            EntityType::Cannonball => Entity::Cannonball(Cannonball {
                id: self.id,
                position: self.position,
                owner_ship: a1,
                source: self.position,
                initial_turns: a2,
                remaining_turns: a2,
            }),
            EntityType::Mine => Entity::Mine(Mine {
                id: self.id,
                position: self.position,
            }),
        }
    }
}

impl std::fmt::Display for EntityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a1, a2, a3, a4] = self.args;
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            self.id, self.kind, self.position.x, self.position.y, a1, a2, a3, a4
        )
    }
}

/// Everything a bot receives for one round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub own_ship_count: usize,
    pub records: Vec<EntityRecord>,
}

impl Observation {
    /// Read one round. Returns `Ok(None)` on a clean end of input.
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Option<Self>, ProtocolError> {
        let own_ship_count = match next_line(reader)? {
            None => return Ok(None),
            Some(line) => parse_count(&line)?,
        };
        let entity_count = next_line(reader)?
            .ok_or(ProtocolError::UnexpectedEof("entity count"))
            .and_then(|line| parse_count(&line))?;

        let mut records = Vec::with_capacity(entity_count);
        for _ in 0..entity_count {
            let line = next_line(reader)?.ok_or(ProtocolError::UnexpectedEof("entity record"))?;
            records.push(EntityRecord::parse(&line)?);
        }

        Ok(Some(Self { own_ship_count, records }))
    }

    /// Authoritative state for this observation, seen from `me`
    pub fn into_state(self, rules: RuleSet, me: PlayerId) -> EngineState {
        EngineState::from_observation(rules, me, self)
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.records.len() + 2);
        lines.push(self.own_ship_count.to_string());
        lines.push(self.records.len().to_string());
        lines.extend(self.records.iter().map(ToString::to_string));
        lines
    }
}

/// Next non-blank line, without its terminator
fn next_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ProtocolError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(line.trim().to_string()));
        }
    }
}

fn parse_count(line: &str) -> Result<usize, ProtocolError> {
    line.trim()
        .parse()
        .map_err(|_| ProtocolError::BadCount(line.to_string()))
}

/// Round input for `player`: own ships, enemy ships, mines within sight of
/// an own ship, cannonballs, barrels
pub fn observe(state: &EngineState, player: PlayerId) -> Observation {
    let mut records = Vec::new();

    for ship in state.alive_ships(player) {
        records.push(EntityRecord::of(&Entity::Ship(ship.clone()), player));
    }
    let own_ship_count = records.len();
    for ship in state.alive_ships(opponent(player)) {
        records.push(EntityRecord::of(&Entity::Ship(ship.clone()), player));
    }

    for mine in state.mines() {
        let visible = state
            .alive_ships(player)
            .any(|s| s.position.distance_to(mine.position) <= MINE_VISIBILITY_RANGE);
        if visible {
            records.push(EntityRecord::of(&Entity::Mine(*mine), player));
        }
    }
    for ball in state.cannonballs() {
        records.push(EntityRecord::of(&Entity::Cannonball(ball.clone()), player));
    }
    for barrel in state.barrels() {
        records.push(EntityRecord::of(&Entity::Barrel(*barrel), player));
    }

    Observation { own_ship_count, records }
}

/// Render the round input for `player` as protocol lines
pub fn render_player_input(state: &EngineState, player: PlayerId) -> Vec<String> {
    observe(state, player).lines()
}

/// Write one command line per ship and flush
pub fn write_actions<W: Write>(out: &mut W, actions: &[CommandLine]) -> io::Result<()> {
    for action in actions {
        writeln!(out, "{}", action)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Command;
    use std::io::Cursor;

    const ROUND: &str = "\
2
5
0 SHIP 3 4 1 2 80 1
2 SHIP 10 4 0 0 100 1
1 SHIP 12 16 5 1 64 0
7 CANNONBALL 9 9 0 2 0 0
9 BARREL 6 6 14 0 0 0
";

    #[test]
    fn test_read_round() {
        let mut reader = Cursor::new(ROUND);
        let obs = Observation::read(&mut reader).unwrap().unwrap();
        assert_eq!(obs.own_ship_count, 2);
        assert_eq!(obs.records.len(), 5);
        assert_eq!(obs.records[0].kind, EntityType::Ship);
        assert_eq!(obs.records[3].args, [0, 2, 0, 0]);
        assert!(Observation::read(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_observation_to_state() {
        let obs = Observation::read(&mut Cursor::new(ROUND)).unwrap().unwrap();
        let state = obs.into_state(RuleSet::default(), 0);

        assert_eq!(state.fleet(0).alive(), &[0, 2]);
        assert_eq!(state.fleet(1).alive(), &[1]);
        let ship = state.ship(0).unwrap();
        assert_eq!((ship.orientation, ship.speed, ship.health), (1, 2, 80));
        assert_eq!(state.cannonballs()[0].remaining_turns, 2);
        assert_eq!(state.barrels()[0].rum, 14);

        // Fresh entities get ids above everything observed
        let mut state = state;
        assert_eq!(state.add_mine(Coord::new(1, 1)), 10);
    }

    #[test]
    fn test_truncated_input() {
        let mut reader = Cursor::new("1\n3\n0 SHIP 3 4 1 2 80 1\n");
        assert!(matches!(
            Observation::read(&mut reader),
            Err(ProtocolError::UnexpectedEof(_))
        ));

        let mut reader = Cursor::new("x\n");
        assert!(matches!(Observation::read(&mut reader), Err(ProtocolError::BadCount(_))));
    }

    #[test]
    fn test_bad_records() {
        assert!(EntityRecord::parse("1 KRAKEN 3 4 0 0 0 0").is_err());
        assert!(EntityRecord::parse("1 SHIP 3 4 0 0 0").is_err());
        assert!(EntityRecord::parse("1 SHIP 3 4 9 0 0 1").is_err());
        assert!(EntityRecord::parse("1 MINE 3 four 0 0 0 0").is_err());
    }

    #[test]
    fn test_render_roundtrip() {
        let state = RuleSet::default().generate_state(3);
        for player in 0..2 {
            let lines = render_player_input(&state, player);
            let text = lines.join("\n");
            let obs = Observation::read(&mut Cursor::new(text)).unwrap().unwrap();
            assert_eq!(obs.own_ship_count, state.alive_count(player));
            assert_eq!(obs.lines(), lines);

            let seen = obs.into_state(*state.rules(), player);
            for ship in state.ships() {
                let view = seen.ship(ship.id).unwrap();
                assert_eq!(view.owner, ship.owner);
                assert_eq!(view.position, ship.position);
            }
        }
    }

    #[test]
    fn test_mines_hidden_beyond_sight() {
        let mut state = EngineState::new(RuleSet::default());
        state.add_ship(Ship::new(0, Coord::new(2, 2), 0, 0));
        state.add_ship(Ship::new(1, Coord::new(20, 18), 0, 1));
        state.add_mine(Coord::new(4, 4));
        state.add_mine(Coord::new(20, 12));

        let mine_count = |player| {
            observe(&state, player)
                .records
                .iter()
                .filter(|r| r.kind == EntityType::Mine)
                .count()
        };
        assert_eq!(mine_count(0), 1);
        assert_eq!(mine_count(1), 0);
    }

    #[test]
    fn test_write_actions() {
        let mut out = Vec::new();
        let actions = vec![
            CommandLine::new(Command::Move(Coord::new(3, 4))),
            CommandLine::new(Command::Wait).with_message("arr"),
        ];
        write_actions(&mut out, &actions).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "MOVE 3 4\nWAIT arr\n");
    }
}
