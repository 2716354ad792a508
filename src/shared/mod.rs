pub mod error;
pub mod macros;
pub mod structs;

pub use error::ConfigError;
pub use error::ControllerError;
pub use structs::ControllerSnapshot;
pub use structs::Direction;
pub use structs::ElevatorState;
pub use structs::FloorRange;
pub use structs::Movement;
pub use structs::SignalKind;
