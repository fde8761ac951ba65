//! Entity records: ships, cannonballs, mines, rum barrels and damage events

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::hex::Coord;
use crate::ruleset::{INITIAL_SHIP_HEALTH, MAX_SHIP_HEALTH};

/// Unique entity identifier, increasing in creation order
pub type EntityId = i32;

/// Player index (0 or 1)
pub type PlayerId = usize;

/// Longest message kept on a ship before truncation
pub const MAX_MESSAGE_LEN: usize = 50;

/// Entity type tag as it appears in the protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Ship,
    Barrel,
    Mine,
    Cannonball,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Ship => "SHIP",
            EntityType::Barrel => "BARREL",
            EntityType::Mine => "MINE",
            EntityType::Cannonball => "CANNONBALL",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHIP" => Ok(EntityType::Ship),
            "BARREL" => Ok(EntityType::Barrel),
            "MINE" => Ok(EntityType::Mine),
            "CANNONBALL" => Ok(EntityType::Cannonball),
            other => Err(other.to_string()),
        }
    }
}

// ============================================================================
// SHIP
// ============================================================================

/// A ship occupies three cells: stern, center and bow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ship {
    pub id: EntityId,
    pub position: Coord,
    pub orientation: u8,
    pub speed: i32,
    pub health: i32,
    pub owner: PlayerId,
    /// Pending action for the current round (None = keep course)
    pub action: Option<Action>,
    pub mine_cooldown: i32,
    pub cannon_cooldown: i32,
    /// Fire target, set together with [`Action::Fire`]
    pub target: Option<Coord>,
    pub message: Option<String>,
}

impl Ship {
    pub fn new(id: EntityId, position: Coord, orientation: u8, owner: PlayerId) -> Self {
        Self {
            id,
            position,
            orientation: orientation % 6,
            speed: 0,
            health: INITIAL_SHIP_HEALTH,
            owner,
            action: None,
            mine_cooldown: 0,
            cannon_cooldown: 0,
            target: None,
            message: None,
        }
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    pub fn bow(&self) -> Coord {
        self.position.neighbor(self.orientation)
    }

    pub fn stern(&self) -> Coord {
        self.position.neighbor((self.orientation + 3) % 6)
    }

    /// Bow, center and stern for a hypothetical center and heading
    pub fn footprint_at(position: Coord, orientation: u8) -> [Coord; 3] {
        [
            position.neighbor(orientation),
            position,
            position.neighbor((orientation + 3) % 6),
        ]
    }

    /// Does any part of the ship cover `coord`
    pub fn at(&self, coord: Coord) -> bool {
        self.stern() == coord || self.bow() == coord || self.position == coord
    }

    /// Remove health, flooring at 0. Returns the amount requested.
    pub fn damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount).max(0);
        amount
    }

    /// Add health, capping at the maximum. Returns the amount requested.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.health = (self.health + amount).min(MAX_SHIP_HEALTH);
        amount
    }

    pub fn is_sunk(&self) -> bool {
        self.health <= 0
    }

    /// Store a message, truncated to [`MAX_MESSAGE_LEN`] characters plus "..."
    pub fn set_message(&mut self, message: Option<&str>) {
        self.message = message.map(truncate_message);
    }
}

/// Truncate free text to [`MAX_MESSAGE_LEN`] characters, marking the cut with "..."
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_LEN {
        let mut cut: String = message.chars().take(MAX_MESSAGE_LEN).collect();
        cut.push_str("...");
        cut
    } else {
        message.to_string()
    }
}

// ============================================================================
// OTHER ENTITIES
// ============================================================================

/// A cannonball in flight; `position` is where it will land
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cannonball {
    pub id: EntityId,
    pub position: Coord,
    pub owner_ship: EntityId,
    pub source: Coord,
    pub initial_turns: i32,
    pub remaining_turns: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mine {
    pub id: EntityId,
    pub position: Coord,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RumBarrel {
    pub id: EntityId,
    pub position: Coord,
    /// Rum granted on pickup
    pub rum: i32,
}

/// Per-round record of an impact, for reporting only
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Damage {
    pub position: Coord,
    pub amount: i32,
    /// false for a cannonball landing in open water
    pub hit: bool,
}

impl Damage {
    pub fn hit(position: Coord, amount: i32) -> Self {
        Self { position, amount, hit: true }
    }

    pub fn splash(position: Coord) -> Self {
        Self { position, amount: 0, hit: false }
    }
}

/// Any entity on the map
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    Ship(Ship),
    Cannonball(Cannonball),
    Mine(Mine),
    Barrel(RumBarrel),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Ship(s) => s.id,
            Entity::Cannonball(c) => c.id,
            Entity::Mine(m) => m.id,
            Entity::Barrel(b) => b.id,
        }
    }

    pub fn position(&self) -> Coord {
        match self {
            Entity::Ship(s) => s.position,
            Entity::Cannonball(c) => c.position,
            Entity::Mine(m) => m.position,
            Entity::Barrel(b) => b.position,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Ship(_) => EntityType::Ship,
            Entity::Cannonball(_) => EntityType::Cannonball,
            Entity::Mine(_) => EntityType::Mine,
            Entity::Barrel(_) => EntityType::Barrel,
        }
    }
}
