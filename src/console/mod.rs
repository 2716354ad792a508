/*
 * Line based driver for the controller.
 *
 * Reads one command per line and turns it into a stimulus, the way button handlers of a
 * user interface would. Transitions are reported by a listener, not by the commands.
 */

/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::warn;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::{ElevatorController, Notification};

/***************************************/
/*               Enums                 */
/***************************************/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cabin(i32),
    CallUp(i32),
    CallDown(i32),
    FloorReached,
    Emergency,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{0}' needs a floor number")]
    MissingFloor(String),

    #[error("'{0}' is not a floor number")]
    InvalidFloor(String),
}

pub const HELP: &str = "\
commands:
  cabin <n>   request floor n from inside the cabin
  up <n>      call the cabin to floor n to go up
  down <n>    call the cabin to floor n to go down
  floor       floor sensor pulse
  emergency   toggle the emergency stop
  status      print the controller state as JSON
  help        this text
  quit        exit";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Command, ParseError> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or("").to_lowercase();
        let mut floor = || parse_floor(&name, words.next());

        match name.as_str() {
            "cabin" | "c" => Ok(Command::Cabin(floor()?)),
            "up" | "u" => Ok(Command::CallUp(floor()?)),
            "down" | "d" => Ok(Command::CallDown(floor()?)),
            "floor" | "f" => Ok(Command::FloorReached),
            "emergency" | "e" => Ok(Command::Emergency),
            "status" | "s" => Ok(Command::Status),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            _ => Err(ParseError::Unknown(line.trim().to_string())),
        }
    }
}

fn parse_floor(command: &str, word: Option<&str>) -> Result<i32, ParseError> {
    let word = word.ok_or_else(|| ParseError::MissingFloor(command.to_string()))?;
    word.parse::<i32>()
        .map_err(|_| ParseError::InvalidFloor(word.to_string()))
}

/***************************************/
/*             Public API              */
/***************************************/

/// One line describing a notification, as printed by the console view.
pub fn describe(notification: &Notification) -> String {
    match notification {
        Notification::StateChanged { old, new } => format!("transition: {} -> {}", old, new),
        Notification::DirectionChanged { old, new } => format!("direction: {} -> {}", old, new),
        Notification::FloorChanged { old, new } => format!("floor: {} -> {}", old, new),
        Notification::SignalChanged { kind, floor, new, .. } => {
            let status = if *new { "on" } else { "off" };
            format!("signal: {} {}", kind.property_name(*floor), status)
        }
    }
}

/// Runs one command. Returns the text to print, if any.
pub fn execute(controller: &ElevatorController, command: Command) -> Option<String> {
    let result = match command {
        Command::Cabin(floor) => controller.request_floor(floor),
        Command::CallUp(floor) => controller.request_call_up(floor),
        Command::CallDown(floor) => controller.request_call_down(floor),
        Command::FloorReached => controller.trigger_floor_reached(),
        Command::Emergency => {
            controller.trigger_emergency_stop();
            Ok(())
        }
        Command::Status => {
            return Some(
                serde_json::to_string(&controller.snapshot())
                    .unwrap_or_else(|e| format!("error: {}", e)),
            );
        }
        Command::Help => return Some(HELP.to_string()),
        Command::Quit => return None,
    };

    match result {
        Ok(()) => None,
        Err(e) => Some(format!("error: {}", e)),
    }
}

/// Reads commands from `input` until end of input or `quit`.
pub fn run<R: BufRead, W: Write>(
    controller: &ElevatorController,
    input: R,
    mut output: W,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Some(reply) = execute(controller, command) {
                    writeln!(output, "{}", reply)?;
                }
            }
            Err(e) => {
                warn!("Unparsable command: {}", line.trim());
                writeln!(output, "{}", e)?;
            }
        }
        output.flush()?;
    }

    Ok(())
}

/***************************************/
/*             Unit tests              */
/***************************************/
