pub mod controller;
pub mod notifications;
pub mod scheduler;
pub mod signals;
pub mod stop_timer;

mod signals_tests;

pub use controller::ElevatorController;
pub use notifications::{Notification, NotificationBus, SubscriptionId};
pub use signals::SignalRegistry;
pub use stop_timer::{PauseHandler, StopTimer};
