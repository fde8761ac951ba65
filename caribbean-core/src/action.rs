//! Ship actions and the player command grammar
//!
//! A command line is a keyword, optional coordinates for MOVE and FIRE, and an
//! optional free-text message:
//!
//! ```text
//! MOVE x y [message] | FIRE x y [message]
//! FASTER | SLOWER | PORT | STARBOARD | MINE | WAIT   [message]
//! ```
//!
//! Keywords are case-insensitive. Coordinates are 1 to 8 decimal digits.

use std::fmt;

use crate::entities::truncate_message;
use crate::hex::Coord;

/// Action resolved by the engine for one ship in one round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Faster,
    Slower,
    Port,
    Starboard,
    Fire,
    Mine,
}

/// A command as written by a player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Move(Coord),
    Faster,
    Slower,
    Port,
    Starboard,
    Mine,
    Fire(Coord),
    Wait,
}

/// One output line: a command plus its optional annotation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub command: Command,
    pub message: Option<String>,
}

/// Error for a line that matches no command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("empty action line")]
    Empty,

    #[error("unknown action keyword: {0}")]
    UnknownKeyword(String),

    #[error("{keyword} expects two coordinates, got: {line}")]
    BadCoordinates { keyword: &'static str, line: String },

    #[error("too many action lines: {given} for {expected} ships")]
    TooManyLines { given: usize, expected: usize },
}

impl Command {
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Move(_) => "MOVE",
            Command::Faster => "FASTER",
            Command::Slower => "SLOWER",
            Command::Port => "PORT",
            Command::Starboard => "STARBOARD",
            Command::Mine => "MINE",
            Command::Fire(_) => "FIRE",
            Command::Wait => "WAIT",
        }
    }

    /// Parse a full line, keeping any trailing annotation
    pub fn parse_line(line: &str) -> Result<CommandLine, ActionParseError> {
        let line = line.trim();
        let (keyword, rest) = split_token(line);
        if keyword.is_empty() {
            return Err(ActionParseError::Empty);
        }

        let upper = keyword.to_ascii_uppercase();
        let (command, rest) = match upper.as_str() {
            "MOVE" => {
                let (coord, rest) = parse_coord("MOVE", line, rest)?;
                (Command::Move(coord), rest)
            }
            "FIRE" => {
                let (coord, rest) = parse_coord("FIRE", line, rest)?;
                (Command::Fire(coord), rest)
            }
            "FASTER" => (Command::Faster, rest),
            "SLOWER" => (Command::Slower, rest),
            "PORT" => (Command::Port, rest),
            "STARBOARD" => (Command::Starboard, rest),
            "MINE" => (Command::Mine, rest),
            "WAIT" => (Command::Wait, rest),
            _ => return Err(ActionParseError::UnknownKeyword(keyword.to_string())),
        };

        let message = if rest.is_empty() { None } else { Some(rest.to_string()) };
        Ok(CommandLine { command, message })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(c) | Command::Fire(c) => write!(f, "{} {}", self.keyword(), c),
            _ => f.write_str(self.keyword()),
        }
    }
}

impl CommandLine {
    pub fn new(command: Command) -> Self {
        Self { command, message: None }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

impl From<Command> for CommandLine {
    fn from(command: Command) -> Self {
        CommandLine::new(command)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} {}", self.command, truncate_message(msg)),
            None => write!(f, "{}", self.command),
        }
    }
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

fn parse_coord<'a>(
    keyword: &'static str,
    line: &str,
    rest: &'a str,
) -> Result<(Coord, &'a str), ActionParseError> {
    let bad = || ActionParseError::BadCoordinates {
        keyword,
        line: line.to_string(),
    };
    let (x, rest) = split_token(rest);
    let (y, rest) = split_token(rest);
    let x = parse_number(x).ok_or_else(bad)?;
    let y = parse_number(y).ok_or_else(bad)?;
    Ok((Coord::new(x, y), rest))
}

fn parse_number(token: &str) -> Option<i32> {
    if token.is_empty() || token.len() > 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_keywords() {
        let cases = [
            ("FASTER", Command::Faster),
            ("slower", Command::Slower),
            ("Port", Command::Port),
            ("STARBOARD", Command::Starboard),
            ("MINE", Command::Mine),
            ("WAIT", Command::Wait),
        ];
        for (line, expected) in cases {
            let parsed = Command::parse_line(line).unwrap();
            assert_eq!(parsed.command, expected);
            assert!(parsed.message.is_none());
        }
    }

    #[test]
    fn test_parse_coordinates_and_message() {
        let parsed = Command::parse_line("MOVE 12 7 heading home").unwrap();
        assert_eq!(parsed.command, Command::Move(Coord::new(12, 7)));
        assert_eq!(parsed.message.as_deref(), Some("heading home"));

        let parsed = Command::parse_line("fire 3   4").unwrap();
        assert_eq!(parsed.command, Command::Fire(Coord::new(3, 4)));
        assert!(parsed.message.is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse_line("   "), Err(ActionParseError::Empty));
        assert!(matches!(
            Command::parse_line("SAIL 3 4"),
            Err(ActionParseError::UnknownKeyword(_))
        ));
        assert!(matches!(
            Command::parse_line("MOVE 3"),
            Err(ActionParseError::BadCoordinates { keyword: "MOVE", .. })
        ));
        assert!(matches!(
            Command::parse_line("FIRE -1 4"),
            Err(ActionParseError::BadCoordinates { .. })
        ));
        assert!(matches!(
            Command::parse_line("FIRE 123456789 4"),
            Err(ActionParseError::BadCoordinates { .. })
        ));
        // Keyword must be a whole token
        assert!(Command::parse_line("WAITING").is_err());
    }

    #[test]
    fn test_display_lines() {
        assert_eq!(CommandLine::new(Command::Fire(Coord::new(4, 9))).to_string(), "FIRE 4 9");
        assert_eq!(
            CommandLine::new(Command::Wait).with_message("hold").to_string(),
            "WAIT hold"
        );
        let long = "y".repeat(80);
        let line = CommandLine::new(Command::Port).with_message(&long).to_string();
        assert_eq!(line.len(), "PORT ".len() + 50 + 3);
    }
}
