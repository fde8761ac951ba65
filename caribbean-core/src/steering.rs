//! Steering toward a target cell (the MOVE command)
//!
//! Picks one of keep-course, PORT, STARBOARD, FASTER or SLOWER from the ship's
//! speed, heading and the bearing to the target. Near-ties are broken by
//! bearing to the map center and finally by a fixed heading rule, so the
//! comparisons below must stay exactly as written.

use crate::action::Action;
use crate::entities::Ship;
use crate::hex::Coord;

/// Angular gaps (in 60 degree units) between each reachable heading and a bearing
#[derive(Clone, Copy, Debug)]
struct Gaps {
    straight: f64,
    port: f64,
    starboard: f64,
}

impl Gaps {
    fn new(orientation: u8, bearing: f64) -> Self {
        let o = orientation as f64;
        Self {
            straight: (o - bearing).abs().min(6.0 - (o - bearing).abs()),
            port: ((o + 1.0) - bearing).abs().min(((o - 5.0) - bearing).abs()),
            starboard: ((o + 5.0) - bearing).abs().min(((o - 1.0) - bearing).abs()),
        }
    }
}

/// Headings where an exact port/starboard tie resolves to starboard
fn starboard_on_tie(orientation: u8) -> bool {
    orientation == 1 || orientation == 4
}

/// Choose the action that brings `ship` toward `target` (None = keep course)
pub fn move_to(ship: &Ship, target: Coord) -> Option<Action> {
    if ship.position == target {
        return Some(Action::Slower);
    }

    match ship.speed {
        0 => steer_from_rest(ship, target),
        1 => steer_underway(ship, target),
        s if s >= 2 => Some(Action::Slower),
        _ => None,
    }
}

/// Stopped: turn toward the bearing, or accelerate once facing it
fn steer_from_rest(ship: &Ship, target: Coord) -> Option<Action> {
    let position = ship.position;
    let orientation = ship.orientation;
    let to_target = Gaps::new(orientation, position.angle(target));
    let to_center = Gaps::new(orientation, position.angle(Coord::map_center()));

    let mut action = None;

    if to_target.port <= to_target.starboard {
        action = Some(Action::Port);
    }

    if to_target.starboard < to_target.port
        || to_target.starboard == to_target.port && to_center.starboard < to_center.port
        || to_target.starboard == to_target.port
            && to_center.starboard == to_center.port
            && starboard_on_tie(orientation)
    {
        action = Some(Action::Starboard);
    }

    let forward = position.neighbor(orientation);
    if forward.is_inside_map()
        && to_target.straight <= to_target.port
        && to_target.straight <= to_target.starboard
    {
        action = Some(Action::Faster);
    }

    action
}

/// Moving at speed 1: judge from the cell we will reach this round
fn steer_underway(ship: &Ship, target: Coord) -> Option<Action> {
    let orientation = ship.orientation;
    let current = ship.position.neighbor(orientation);
    if !current.is_inside_map() {
        return Some(Action::Slower);
    }

    if current == target {
        return None;
    }

    let to_target = Gaps::new(orientation, current.angle(target));
    let to_center = Gaps::new(orientation, current.angle(Coord::map_center()));

    // Next to the target with a bad angle: slow down and turn instead of
    // circling around it
    if current.distance_to(target) == 1 && to_target.straight > 1.5 {
        return Some(Action::Slower);
    }

    let mut distance_min: Option<i32> = None;
    let mut action: Option<Action> = None;

    let next = current.neighbor(orientation);
    if next.is_inside_map() {
        distance_min = Some(next.distance_to(target));
    }

    let next = current.neighbor((orientation + 1) % 6);
    if next.is_inside_map() {
        let distance = next.distance_to(target);
        let better = match distance_min {
            None => true,
            Some(min) => {
                distance < min || distance == min && to_target.port < to_target.straight - 0.5
            }
        };
        if better {
            distance_min = Some(distance);
            action = Some(Action::Port);
        }
    }

    let next = current.neighbor((orientation + 5) % 6);
    if next.is_inside_map() {
        let distance = next.distance_to(target);
        let better = match distance_min {
            None => true,
            Some(min) => {
                let tied = distance == min;
                let after_port = action == Some(Action::Port);
                let port_tie = to_target.starboard == to_target.port;
                distance < min
                    || tied && after_port && to_target.starboard < to_target.port - 0.5
                    || tied && action.is_none() && to_target.starboard < to_target.straight - 0.5
                    || tied && after_port && port_tie && to_center.starboard < to_center.port
                    || tied
                        && after_port
                        && port_tie
                        && to_center.starboard == to_center.port
                        && starboard_on_tie(orientation)
            }
        };
        if better {
            action = Some(Action::Starboard);
        }
    }

    action
}
