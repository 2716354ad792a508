/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::ControllerError;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevatorState {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "movingUp")]
    MovingUp,
    #[serde(rename = "movingDown")]
    MovingDown,
    #[serde(rename = "stoppingAtNextFloor")]
    StoppingAtNextFloor,
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "emergencyStop")]
    EmergencyStop,
}

impl ElevatorState {
    pub fn is_moving(&self) -> bool {
        matches!(self, ElevatorState::MovingUp | ElevatorState::MovingDown)
    }
}

impl fmt::Display for ElevatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElevatorState::Idle => "idle",
            ElevatorState::MovingUp => "moving up",
            ElevatorState::MovingDown => "moving down",
            ElevatorState::StoppingAtNextFloor => "stopping at next floor",
            ElevatorState::Stopped => "stopped",
            ElevatorState::EmergencyStop => "emergency stop",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match *self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Floor offset of one step of travel in this direction.
    pub fn step(&self) -> i32 {
        match *self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// The moving state that corresponds to travelling in this direction.
    pub fn moving_state(&self) -> ElevatorState {
        match *self {
            Direction::Up => ElevatorState::MovingUp,
            Direction::Down => ElevatorState::MovingDown,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Outcome of a dispatch decision. Never stored as state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    None,
}

impl Movement {
    pub fn direction(&self) -> Option<Direction> {
        match *self {
            Movement::Up => Some(Direction::Up),
            Movement::Down => Some(Direction::Down),
            Movement::None => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    #[serde(rename = "cabinRequest")]
    CabinRequest,
    #[serde(rename = "callUp")]
    CallUp,
    #[serde(rename = "callDown")]
    CallDown,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::CabinRequest, SignalKind::CallUp, SignalKind::CallDown];

    pub fn property_prefix(&self) -> &'static str {
        match *self {
            SignalKind::CabinRequest => "cabinRequest",
            SignalKind::CallUp => "callUp",
            SignalKind::CallDown => "callDown",
        }
    }

    /// Attribute name under which changes of this signal at `floor` are published.
    pub fn property_name(&self, floor: i32) -> String {
        format!("{}{}", self.property_prefix(), floor)
    }

    /// Hall call that asks for travel in `direction`.
    pub fn call_for(direction: Direction) -> SignalKind {
        match direction {
            Direction::Up => SignalKind::CallUp,
            Direction::Down => SignalKind::CallDown,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.property_prefix())
    }
}

/**
 * Inclusive range of floors served by the cabin.
 *
 * Floors may be negative, `first` is always strictly below `last`. Every floor-indexed
 * container in the crate is addressed with the offset `floor - first`.
 */
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorRange {
    first: i32,
    last: i32,
}

impl FloorRange {
    pub fn new(first: i32, last: i32) -> Result<FloorRange, ControllerError> {
        if first >= last {
            return Err(ControllerError::InvalidFloorRange { first, last });
        }
        Ok(FloorRange { first, last })
    }

    pub fn first(&self) -> i32 {
        self.first
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    pub fn contains(&self, floor: i32) -> bool {
        floor >= self.first && floor <= self.last
    }

    /// Number of floors, both ends included.
    pub fn len(&self) -> usize {
        self.offset(self.last) + 1
    }

    // Computed in i64, `last - first` does not fit an i32 for the widest ranges
    pub fn offset(&self, floor: i32) -> usize {
        (i64::from(floor) - i64::from(self.first)) as usize
    }

    /// Floor one step away from `floor` in `direction`, if the range has one.
    pub fn next(&self, floor: i32, direction: Direction) -> Option<i32> {
        floor
            .checked_add(direction.step())
            .filter(|next| self.contains(*next))
    }

    /// Whether `kind` exists at `floor`: no call-up at the top, no call-down at the bottom.
    pub fn accepts(&self, kind: SignalKind, floor: i32) -> bool {
        match kind {
            SignalKind::CabinRequest => self.contains(floor),
            SignalKind::CallUp => floor >= self.first && floor < self.last,
            SignalKind::CallDown => floor > self.first && floor <= self.last,
        }
    }
}

/// Point-in-time view of the controller, suitable for printing or serialising.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub state: ElevatorState,
    pub direction: Direction,
    #[serde(rename = "currentFloor")]
    pub current_floor: i32,
    #[serde(rename = "firstFloor")]
    pub first_floor: i32,
    #[serde(rename = "lastFloor")]
    pub last_floor: i32,
    #[serde(rename = "cabinRequests")]
    pub cabin_requests: Vec<bool>,
    #[serde(rename = "callUp")]
    pub call_up: Vec<bool>,
    #[serde(rename = "callDown")]
    pub call_down: Vec<bool>,
}
