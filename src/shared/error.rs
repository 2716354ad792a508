/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::io;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, ElevatorState, SignalKind};

/***************************************/
/*               Errors                */
/***************************************/

/// Errors returned by the controller and the signal registry.
///
/// None of them are fatal. The controller state is left untouched whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The floor does not exist for this kind of signal.
    #[error("floor {floor} is out of range for {kind}")]
    OutOfRange { kind: SignalKind, floor: i32 },

    /// A floor sensor pulse arrived while the cabin was not travelling.
    #[error("floor reached while {state}")]
    InvalidTransition { state: ElevatorState },

    /// A floor sensor pulse arrived with no floor left in the direction of travel.
    #[error("floor reached while moving {direction} from terminal floor {floor}")]
    NoFloorBeyond { floor: i32, direction: Direction },

    #[error("invalid floor range: first floor {first} must be below last floor {last}")]
    InvalidFloorRange { first: i32, last: i32 },

    /// The stop timer worker is gone, the pause cannot be scheduled.
    #[error("stop timer is not running")]
    TimerUnavailable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid floor range: first floor {first} must be below last floor {last}")]
    InvalidFloorRange { first: i32, last: i32 },
}
