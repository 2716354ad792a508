/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::notifications::{Notification, NotificationBus};
use crate::shared::{ControllerError, Direction, FloorRange, SignalKind};

/**
 * Registry of pending floor requests.
 *
 * Holds one flag per floor and signal kind. Cabin requests exist on every floor, call-up
 * everywhere but the last floor and call-down everywhere but the first floor. Each slot is
 * an atomic on its own, there is no transaction across slots.
 *
 * # Fields
 * - `range`:           Floors served by the cabin.
 * - `cabin_requests`:  Requests made from inside the cabin, indexed by `floor - first`.
 * - `call_up`:         Hall calls to go up, indexed by `floor - first`.
 * - `call_down`:       Hall calls to go down, indexed by `floor - first - 1`.
 * - `bus`:             Receives a `SignalChanged` notification for every effective change.
 */
pub struct SignalRegistry {
    range: FloorRange,
    cabin_requests: Vec<AtomicBool>,
    call_up: Vec<AtomicBool>,
    call_down: Vec<AtomicBool>,
    bus: Arc<NotificationBus>,
}

impl SignalRegistry {
    pub fn new(range: FloorRange, bus: Arc<NotificationBus>) -> SignalRegistry {
        let hall_slots = range.len() - 1;
        SignalRegistry {
            range,
            cabin_requests: (0..range.len()).map(|_| AtomicBool::new(false)).collect(),
            call_up: (0..hall_slots).map(|_| AtomicBool::new(false)).collect(),
            call_down: (0..hall_slots).map(|_| AtomicBool::new(false)).collect(),
            bus,
        }
    }

    pub fn range(&self) -> FloorRange {
        self.range
    }

    pub fn get(&self, kind: SignalKind, floor: i32) -> Result<bool, ControllerError> {
        Ok(self.slot(kind, floor)?.load(Ordering::SeqCst))
    }

    /// Like `get`, but a slot that does not exist reads as `false`.
    pub fn is_set(&self, kind: SignalKind, floor: i32) -> bool {
        self.get(kind, floor).unwrap_or(false)
    }

    /// Stores `value` and returns the previous one. Publishes only when the value changed.
    pub fn set(&self, kind: SignalKind, floor: i32, value: bool) -> Result<bool, ControllerError> {
        let old = self.slot(kind, floor)?.swap(value, Ordering::SeqCst);
        if old != value {
            debug!("Signal {} changed: {} -> {}", kind.property_name(floor), old, value);
            self.bus.publish(Notification::SignalChanged {
                kind,
                floor,
                old,
                new: value,
            });
        }
        Ok(old)
    }

    /// Resets every signal, publishing each one that was set.
    pub fn clear_all(&self) {
        for kind in SignalKind::ALL {
            for floor in self.range.first()..=self.range.last() {
                if self.range.accepts(kind, floor) {
                    let _ = self.set(kind, floor, false);
                }
            }
        }
    }

    /// Consumes the signals served by stopping at `floor` while travelling in `direction`.
    ///
    /// The cabin request is always consumed, a hall call only when it matches `direction`.
    pub fn clear_for_arrival(&self, floor: i32, direction: Direction) {
        let _ = self.set(SignalKind::CabinRequest, floor, false);

        if direction == Direction::Down && floor > self.range.first() {
            let _ = self.set(SignalKind::CallDown, floor, false);
        }

        if direction == Direction::Up && floor < self.range.last() {
            let _ = self.set(SignalKind::CallUp, floor, false);
        }
    }

    #[cfg(test)]
    pub(crate) fn any_set(&self) -> bool {
        self.cabin_requests
            .iter()
            .chain(self.call_up.iter())
            .chain(self.call_down.iter())
            .any(|slot| slot.load(Ordering::SeqCst))
    }

    /// Current values of every slot of `kind`, lowest floor first.
    pub fn values(&self, kind: SignalKind) -> Vec<bool> {
        let slots = match kind {
            SignalKind::CabinRequest => &self.cabin_requests,
            SignalKind::CallUp => &self.call_up,
            SignalKind::CallDown => &self.call_down,
        };
        slots.iter().map(|slot| slot.load(Ordering::SeqCst)).collect()
    }

    fn slot(&self, kind: SignalKind, floor: i32) -> Result<&AtomicBool, ControllerError> {
        if !self.range.accepts(kind, floor) {
            return Err(ControllerError::OutOfRange { kind, floor });
        }

        let offset = self.range.offset(floor);
        let slot = match kind {
            SignalKind::CabinRequest => &self.cabin_requests[offset],
            SignalKind::CallUp => &self.call_up[offset],
            SignalKind::CallDown => &self.call_down[offset - 1],
        };
        Ok(slot)
    }
}
