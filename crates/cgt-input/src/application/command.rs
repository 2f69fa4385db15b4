//! Line-oriented input commands read by the `cgt-input` binary.
//!
//! ```text
//! press 0x41        release 65
//! move 960 540      wheel 0 -1
//! click left        down left      up left
//! reset             quit
//! ```
//!
//! Key codes are Windows virtual-key codes, decimal or `0x` hex.  Positions
//! are host screen pixels and are scaled through the client's viewport.

use cgt_core::hid::{HidError, MouseButton};
use thiserror::Error;

use super::virtual_hid::{ReportWriter, VirtualHidClient};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid {what} '{value}'")]
    InvalidArgument { what: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Press(u8),
    Release(u8),
    Move { x: i32, y: i32 },
    Click(MouseButton),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Wheel { hwheel: i8, vwheel: i8 },
    Reset,
    Quit,
}

impl Command {
    /// Parses one line.  Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "press" => Command::Press(key_arg(words.next(), "press")?),
            "release" => Command::Release(key_arg(words.next(), "release")?),
            "move" => {
                let x = number_arg(words.next(), "move", "<x> <y>", "x coordinate")?;
                let y = number_arg(words.next(), "move", "<x> <y>", "y coordinate")?;
                Command::Move { x, y }
            }
            "click" => Command::Click(button_arg(words.next(), "click")?),
            "down" => Command::ButtonDown(button_arg(words.next(), "down")?),
            "up" => Command::ButtonUp(button_arg(words.next(), "up")?),
            "wheel" => {
                let hwheel = number_arg(words.next(), "wheel", "<h> <v>", "horizontal wheel delta")?;
                let vwheel = number_arg(words.next(), "wheel", "<h> <v>", "vertical wheel delta")?;
                Command::Wheel { hwheel, vwheel }
            }
            "reset" => Command::Reset,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Applies the command to `client`.  `Quit` is a no-op here; the caller
    /// ends its loop on it.
    pub fn apply<W: ReportWriter>(self, client: &mut VirtualHidClient<W>) -> Result<(), HidError> {
        match self {
            Command::Press(vk) => client.press_by_host_code(vk),
            Command::Release(vk) => client.release_by_host_code(vk),
            Command::Move { x, y } => {
                let pos = client.to_logical(x, y);
                client.absolute().move_to(pos.x, pos.y)
            }
            Command::Click(button) => {
                let pos = client.absolute_state().position();
                let mut pointer = client.absolute();
                pointer.button_press(button, pos.x, pos.y)?;
                pointer.button_release(button, pos.x, pos.y)
            }
            Command::ButtonDown(button) => {
                let pos = client.absolute_state().position();
                client.absolute().button_press(button, pos.x, pos.y)
            }
            Command::ButtonUp(button) => {
                let pos = client.absolute_state().position();
                client.absolute().button_release(button, pos.x, pos.y)
            }
            Command::Wheel { hwheel, vwheel } => client.absolute().wheel(hwheel, vwheel),
            Command::Reset => client.reset(),
            Command::Quit => Ok(()),
        }
    }
}

fn key_arg(word: Option<&str>, command: &'static str) -> Result<u8, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument {
        command,
        expected: "a virtual-key code",
    })?;
    let parsed = match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => word.parse(),
    };
    parsed.map_err(|_| CommandError::InvalidArgument {
        what: "virtual-key code",
        value: word.to_string(),
    })
}

fn number_arg<T: std::str::FromStr>(
    word: Option<&str>,
    command: &'static str,
    expected: &'static str,
    what: &'static str,
) -> Result<T, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument { command, expected })?;
    word.parse().map_err(|_| CommandError::InvalidArgument {
        what,
        value: word.to_string(),
    })
}

fn button_arg(word: Option<&str>, command: &'static str) -> Result<MouseButton, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument {
        command,
        expected: "a button name",
    })?;
    MouseButton::from_name(word).ok_or_else(|| CommandError::InvalidArgument {
        what: "mouse button",
        value: word.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes_accept_hex_and_decimal() {
        assert_eq!(Command::parse("press 0x41"), Ok(Some(Command::Press(0x41))));
        assert_eq!(Command::parse("release 65"), Ok(Some(Command::Release(65))));
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   # warm-up"), Ok(None));
        assert_eq!(Command::parse("reset # again"), Ok(Some(Command::Reset)));
    }

    #[test]
    fn test_pointer_commands() {
        assert_eq!(Command::parse("move 960 -5"), Ok(Some(Command::Move { x: 960, y: -5 })));
        assert_eq!(Command::parse("CLICK Right"), Ok(Some(Command::Click(MouseButton::Right))));
        assert_eq!(Command::parse("down x1"), Ok(Some(Command::ButtonDown(MouseButton::Back))));
        assert_eq!(
            Command::parse("wheel 0 -1"),
            Ok(Some(Command::Wheel { hwheel: 0, vwheel: -1 }))
        );
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert_eq!(
            Command::parse("jump"),
            Err(CommandError::UnknownCommand("jump".into()))
        );
        assert!(matches!(
            Command::parse("move 10"),
            Err(CommandError::MissingArgument { command: "move", .. })
        ));
        assert!(matches!(
            Command::parse("press 0x1FF"),
            Err(CommandError::InvalidArgument { what: "virtual-key code", .. })
        ));
        assert!(matches!(
            Command::parse("wheel 0 200"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Command::parse("click sideways"),
            Err(CommandError::InvalidArgument { what: "mouse button", .. })
        ));
    }
}
