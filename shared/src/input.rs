//! Text commands from the input-device layer.
//!
//! The binaries read one command per line from stdin and push the parsed
//! [`InputCommand`] into the running session; nothing here touches the
//! terminal itself.

use crate::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Steer(Direction),
    Reset,
    /// Abandon the current match and return to the menu.
    Leave,
    SinglePlayer,
    Host,
    Join(String),
    Quit,
}

/// Parses a single input line. Blank or unknown lines yield `None`.
pub fn parse_command(line: &str) -> Option<InputCommand> {
    let mut words = line.split_whitespace();
    let keyword = words.next()?.to_ascii_lowercase();

    let command = match keyword.as_str() {
        "w" | "up" | "k" => InputCommand::Steer(Direction::Up),
        "s" | "down" | "j" => InputCommand::Steer(Direction::Down),
        "a" | "left" | "h" => InputCommand::Steer(Direction::Left),
        "d" | "right" | "l" => InputCommand::Steer(Direction::Right),
        "r" | "reset" | "restart" => InputCommand::Reset,
        "menu" | "leave" => InputCommand::Leave,
        "single" | "solo" => InputCommand::SinglePlayer,
        "host" => InputCommand::Host,
        "join" => InputCommand::Join(words.next()?.to_string()),
        "q" | "quit" | "exit" => InputCommand::Quit,
        _ => return None,
    };

    Some(command)
}
