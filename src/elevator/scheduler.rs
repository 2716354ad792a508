/*
 * Dispatch policy for a single cabin.
 *
 * SCAN style: keep serving requests in the direction of travel and only turn around once
 * nothing is left ahead. All functions are read-only queries over the signal registry, the
 * controller decides what to do with the answers.
 */

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::signals::SignalRegistry;
use crate::shared::{Direction, Movement, SignalKind};

// Any request strictly above `floor`
pub fn has_request_above(signals: &SignalRegistry, floor: i32) -> bool {
    let last = signals.range().last();
    match floor.checked_add(1) {
        Some(above) => (above..=last).any(|f| has_request_at(signals, f)),
        None => false,
    }
}

// Any request strictly below `floor`
pub fn has_request_below(signals: &SignalRegistry, floor: i32) -> bool {
    let first = signals.range().first();
    (first..floor).rev().any(|f| has_request_at(signals, f))
}

pub fn has_request_ahead(signals: &SignalRegistry, floor: i32, direction: Direction) -> bool {
    match direction {
        Direction::Up => has_request_above(signals, floor),
        Direction::Down => has_request_below(signals, floor),
    }
}

/**
 * Decides whether the cabin, now at `floor` and travelling in `direction`, must stop at the
 * next floor.
 *
 * Stops for a cabin request, for a hall call in the direction of travel, and for a hall call
 * in the opposite direction only when nothing further ahead would pull the cabin past it.
 * A call at the terminal floor is always taken since the cabin cannot go further anyway.
 */
pub fn should_stop_at_next(signals: &SignalRegistry, floor: i32, direction: Direction) -> bool {
    let range = signals.range();
    let next = match range.next(floor, direction) {
        Some(next) => next,
        None => return false,
    };

    let opposite_call = SignalKind::call_for(direction.opposite());
    let same_call = SignalKind::call_for(direction);
    let terminal = match direction {
        Direction::Up => range.last(),
        Direction::Down => range.first(),
    };

    if signals.is_set(SignalKind::CabinRequest, next)
        || (signals.is_set(opposite_call, next) && !has_request_ahead(signals, next, direction))
    {
        return true;
    }

    next != terminal && signals.is_set(same_call, next)
}

/// Chooses where to go from `floor`, preferring to keep the current `bias`.
pub fn decide_movement(signals: &SignalRegistry, floor: i32, bias: Direction) -> Movement {
    let to_movement = |direction: Direction| match direction {
        Direction::Up => Movement::Up,
        Direction::Down => Movement::Down,
    };

    if has_request_ahead(signals, floor, bias) {
        return to_movement(bias);
    }
    if has_request_ahead(signals, floor, bias.opposite()) {
        return to_movement(bias.opposite());
    }
    Movement::None
}

fn has_request_at(signals: &SignalRegistry, floor: i32) -> bool {
    signals.is_set(SignalKind::CabinRequest, floor)
        || signals.is_set(SignalKind::CallUp, floor)
        || signals.is_set(SignalKind::CallDown, floor)
}
