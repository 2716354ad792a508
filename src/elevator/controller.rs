/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;
use crate::elevator::notifications::{Notification, NotificationBus, SubscriptionId};
use crate::elevator::scheduler;
use crate::elevator::signals::SignalRegistry;
use crate::elevator::stop_timer::{PauseHandler, StopTimer};
use crate::shared::{
    ControllerError, ControllerSnapshot, Direction, ElevatorState, FloorRange, Movement, SignalKind,
};

#[derive(Debug, Clone, Copy)]
struct Cabin {
    state: ElevatorState,
    direction: Direction,
    floor: i32,
    stop_sequence: u64,
}

/**
 * Control logic of a single elevator cabin.
 *
 * External stimuli (requests, floor sensor pulses, the emergency switch) arrive as method
 * calls. Each one is handled to completion while holding the `cabin` lock, so state,
 * direction and floor always change together. The lock is also held by the resume decision
 * run from the stop timer, including its reversal delay.
 *
 * Every change is published on the notification bus, synchronously, on the thread that made
 * it. Listeners may read the accessors but must not call the stimulus methods.
 *
 * # Fields
 * - `range`:           Floors served.
 * - `pause`:           Doors-open time at each stop.
 * - `reversal_delay`:  Extra wait when the cabin turns around at a stop.
 * - `bus`:             Change notifications for listeners.
 * - `signals`:         Pending requests.
 * - `cabin`:           Authoritative state, locked for the whole handling of an event.
 * - `published`:       Copy of `cabin` for readers, refreshed on every change.
 * - `stop_timer`:      Delivers expired pauses back to `pause_elapsed`.
 */
pub struct ElevatorController {
    range: FloorRange,
    pause: Duration,
    reversal_delay: Duration,
    bus: Arc<NotificationBus>,
    signals: SignalRegistry,
    cabin: Mutex<Cabin>,
    published: RwLock<Cabin>,
    stop_timer: StopTimer,
}

impl ElevatorController {
    /// Builds an idle controller at the first floor, biased upwards, and starts its timer thread.
    pub fn new(config: &ElevatorConfig) -> Result<Arc<ElevatorController>, ControllerError> {
        let range = config.floor_range()?;
        let bus = Arc::new(NotificationBus::new());
        let (stop_timer, stop_timer_worker) = StopTimer::new();

        let cabin = Cabin {
            state: ElevatorState::Idle,
            direction: Direction::Up,
            floor: range.first(),
            stop_sequence: 0,
        };

        let controller = Arc::new(ElevatorController {
            range,
            pause: config.pause_duration(),
            reversal_delay: config.reversal_delay(),
            signals: SignalRegistry::new(range, bus.clone()),
            bus,
            cabin: Mutex::new(cabin),
            published: RwLock::new(cabin),
            stop_timer,
        });

        let handler: Weak<ElevatorController> = Arc::downgrade(&controller);
        let handler: Weak<dyn PauseHandler> = handler;
        stop_timer_worker
            .spawn(handler)
            .map_err(|_| ControllerError::TimerUnavailable)?;

        Ok(controller)
    }

    /***************************************/
    /*              Stimuli                */
    /***************************************/

    /// Toggles emergency mode. Entering it drops every pending request.
    pub fn trigger_emergency_stop(&self) {
        let mut cabin = self.lock();

        if cabin.state != ElevatorState::EmergencyStop {
            warn!("Emergency stop engaged at floor {}", cabin.floor);
            self.change_state(&mut cabin, ElevatorState::EmergencyStop);
            self.signals.clear_all();
        } else {
            info!("Emergency stop released at floor {}", cabin.floor);
            self.change_state(&mut cabin, ElevatorState::Idle);
        }
    }

    /// Floor sensor pulse: the cabin reached the next floor in its direction of travel.
    pub fn trigger_floor_reached(&self) -> Result<(), ControllerError> {
        let mut cabin = self.lock();

        let in_transit = cabin.state.is_moving() || cabin.state == ElevatorState::StoppingAtNextFloor;
        if !in_transit {
            warn!(
                "Floor reached ignored: cabin is {} at floor {}",
                cabin.state, cabin.floor
            );
            return Err(ControllerError::InvalidTransition { state: cabin.state });
        }

        let next = match self.range.next(cabin.floor, cabin.direction) {
            Some(next) => next,
            None => {
                warn!(
                    "Floor reached ignored: moving {} from terminal floor {}",
                    cabin.direction, cabin.floor
                );
                return Err(ControllerError::NoFloorBeyond {
                    floor: cabin.floor,
                    direction: cabin.direction,
                });
            }
        };

        self.change_floor(&mut cabin, next);

        match cabin.state {
            ElevatorState::StoppingAtNextFloor => {
                self.change_state(&mut cabin, ElevatorState::Stopped);
                self.signals.clear_for_arrival(cabin.floor, cabin.direction);
                self.schedule_stop(&mut cabin)?;
            }
            _ => {
                if scheduler::should_stop_at_next(&self.signals, cabin.floor, cabin.direction) {
                    self.change_state(&mut cabin, ElevatorState::StoppingAtNextFloor);
                }
            }
        }

        Ok(())
    }

    /// Cabin button for `floor`.
    pub fn request_floor(&self, floor: i32) -> Result<(), ControllerError> {
        self.handle_request(SignalKind::CabinRequest, floor)
    }

    /// Hall button asking to go up from `floor`. Does not exist on the last floor.
    pub fn request_call_up(&self, floor: i32) -> Result<(), ControllerError> {
        self.handle_request(SignalKind::CallUp, floor)
    }

    /// Hall button asking to go down from `floor`. Does not exist on the first floor.
    pub fn request_call_down(&self, floor: i32) -> Result<(), ControllerError> {
        self.handle_request(SignalKind::CallDown, floor)
    }

    /***************************************/
    /*             Accessors               */
    /***************************************/
    pub fn current_state(&self) -> ElevatorState {
        self.read().state
    }

    pub fn current_floor(&self) -> i32 {
        self.read().floor
    }

    /// Direction of travel, or the last one when the cabin is not moving.
    pub fn current_direction(&self) -> Direction {
        self.read().direction
    }

    pub fn first_floor(&self) -> i32 {
        self.range.first()
    }

    pub fn last_floor(&self) -> i32 {
        self.range.last()
    }

    pub fn pause_duration(&self) -> Duration {
        self.pause
    }

    pub fn reversal_delay(&self) -> Duration {
        self.reversal_delay
    }

    pub fn signal(&self, kind: SignalKind, floor: i32) -> Result<bool, ControllerError> {
        self.signals.get(kind, floor)
    }

    pub fn has_request_above(&self, floor: i32) -> bool {
        scheduler::has_request_above(&self.signals, floor)
    }

    pub fn has_request_below(&self, floor: i32) -> bool {
        scheduler::has_request_below(&self.signals, floor)
    }

    /// Whether travelling in `direction` from the current floor must stop at the next one.
    pub fn should_stop_at_next(&self, direction: Direction) -> bool {
        scheduler::should_stop_at_next(&self.signals, self.current_floor(), direction)
    }

    /// Movement the dispatcher would choose from the current floor with the given bias.
    pub fn decide_movement(&self, bias: Direction) -> Movement {
        scheduler::decide_movement(&self.signals, self.current_floor(), bias)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let cabin = self.read();
        ControllerSnapshot {
            state: cabin.state,
            direction: cabin.direction,
            current_floor: cabin.floor,
            first_floor: self.range.first(),
            last_floor: self.range.last(),
            cabin_requests: self.signals.values(SignalKind::CabinRequest),
            call_up: self.signals.values(SignalKind::CallUp),
            call_down: self.signals.values(SignalKind::CallDown),
        }
    }

    /***************************************/
    /*           Subscriptions             */
    /***************************************/
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_to<F>(&self, property: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.bus.subscribe_to(property, listener)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, cbc::Receiver<Notification>) {
        self.bus.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /***************************************/
    /*          Event handling             */
    /***************************************/
    fn handle_request(&self, kind: SignalKind, floor: i32) -> Result<(), ControllerError> {
        if !self.range.accepts(kind, floor) {
            warn!("Rejected {} request for floor {}", kind, floor);
            return Err(ControllerError::OutOfRange { kind, floor });
        }

        let mut cabin = self.lock();

        match cabin.state {
            ElevatorState::EmergencyStop => {
                warn!("Ignored {} request for floor {} during emergency stop", kind, floor);
            }
            ElevatorState::Idle if floor == cabin.floor => {
                self.serve_in_place(&mut cabin, kind)?;
            }
            ElevatorState::Idle => {
                self.signals.set(kind, floor, true)?;
                self.dispatch(&mut cabin);
            }
            ElevatorState::MovingUp | ElevatorState::MovingDown => {
                self.signals.set(kind, floor, true)?;
                if scheduler::should_stop_at_next(&self.signals, cabin.floor, cabin.direction) {
                    self.change_state(&mut cabin, ElevatorState::StoppingAtNextFloor);
                }
            }
            ElevatorState::Stopped
                if floor == cabin.floor && served_at_stop(kind, cabin.direction) =>
            {
                debug!("{} request for floor {} served, doors are open", kind, floor);
            }
            ElevatorState::Stopped | ElevatorState::StoppingAtNextFloor => {
                self.signals.set(kind, floor, true)?;
            }
        }

        Ok(())
    }

    // An idle cabin already at the requested floor just opens its doors
    fn serve_in_place(&self, cabin: &mut Cabin, kind: SignalKind) -> Result<(), ControllerError> {
        match kind {
            SignalKind::CallUp => self.change_direction(cabin, Direction::Up),
            SignalKind::CallDown => self.change_direction(cabin, Direction::Down),
            SignalKind::CabinRequest => {}
        }

        info!("Opening doors at floor {} for {}", cabin.floor, kind);
        self.change_state(cabin, ElevatorState::Stopped);
        self.schedule_stop(cabin)
    }

    /// Resume decision, run when the doors-open pause of stop `sequence` is over.
    fn resume_after_pause(&self, sequence: u64) {
        let mut cabin = self.lock();

        if cabin.state != ElevatorState::Stopped || cabin.stop_sequence != sequence {
            debug!(
                "Stale stop #{} ignored (cabin is {}, current stop #{})",
                sequence, cabin.state, cabin.stop_sequence
            );
            return;
        }

        // Turn around for a call waiting here when nothing is left ahead
        loop {
            let bias = cabin.direction;
            let waiting_call = SignalKind::call_for(bias.opposite());

            if scheduler::has_request_ahead(&self.signals, cabin.floor, bias)
                || !self.signals.is_set(waiting_call, cabin.floor)
            {
                break;
            }

            info!("Reversing at floor {} for {}", cabin.floor, waiting_call);
            let _ = self.signals.set(waiting_call, cabin.floor, false);
            self.change_direction(&mut cabin, bias.opposite());
            thread::sleep(self.reversal_delay);
        }

        self.dispatch(&mut cabin);
    }

    fn dispatch(&self, cabin: &mut Cabin) {
        let movement = scheduler::decide_movement(&self.signals, cabin.floor, cabin.direction);

        match movement.direction() {
            None => self.change_state(cabin, ElevatorState::Idle),
            Some(direction) => {
                self.change_direction(cabin, direction);
                if scheduler::should_stop_at_next(&self.signals, cabin.floor, direction) {
                    self.change_state(cabin, ElevatorState::StoppingAtNextFloor);
                } else {
                    self.change_state(cabin, direction.moving_state());
                }
            }
        }
    }

    fn schedule_stop(&self, cabin: &mut Cabin) -> Result<(), ControllerError> {
        cabin.stop_sequence += 1;
        self.stop_timer.schedule(self.pause, cabin.stop_sequence)
    }

    /***************************************/
    /*          State mutation             */
    /***************************************/
    fn change_state(&self, cabin: &mut Cabin, new: ElevatorState) {
        let old = cabin.state;
        if old == new {
            return;
        }

        cabin.state = new;
        self.publish(cabin);
        info!("Transition: {} -> {} (floor {})", old, new, cabin.floor);
        self.bus.publish(Notification::StateChanged { old, new });
    }

    fn change_direction(&self, cabin: &mut Cabin, new: Direction) {
        let old = cabin.direction;
        if old == new {
            return;
        }

        cabin.direction = new;
        self.publish(cabin);
        debug!("Direction: {} -> {}", old, new);
        self.bus.publish(Notification::DirectionChanged { old, new });
    }

    fn change_floor(&self, cabin: &mut Cabin, new: i32) {
        let old = cabin.floor;

        cabin.floor = new;
        self.publish(cabin);
        info!("Floor {} -> {} ({})", old, new, cabin.state);
        self.bus.publish(Notification::FloorChanged { old, new });
    }

    fn publish(&self, cabin: &Cabin) {
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = *cabin;
    }

    fn read(&self) -> Cabin {
        *self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Cabin> {
        self.cabin.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PauseHandler for ElevatorController {
    fn pause_elapsed(&self, sequence: u64) {
        self.resume_after_pause(sequence);
    }
}

// Requests consumed on the spot by a cabin standing at the floor with its doors open
fn served_at_stop(kind: SignalKind, direction: Direction) -> bool {
    match kind {
        SignalKind::CabinRequest => true,
        SignalKind::CallUp => direction == Direction::Up,
        SignalKind::CallDown => direction == Direction::Down,
    }
}
