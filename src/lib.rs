/*
 * Control logic of a single-cabin elevator.
 *
 * The `elevator` module holds the controller state machine, the request registry, the
 * dispatch policy and the doors-open timer. `shared` holds the domain types and errors,
 * `console` a line-based driver standing in for a user interface.
 */

/* Modules */
pub mod config;
pub mod console;
pub mod elevator;
pub mod shared;

pub use config::{Config, ElevatorConfig};
pub use elevator::{ElevatorController, Notification, SubscriptionId};
pub use shared::{ControllerError, ControllerSnapshot, Direction, ElevatorState, Movement, SignalKind};
