/*
 * Unit tests for the signal registry
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_signals_start_cleared
 * - test_set_get_round_trip
 * - test_hall_calls_missing_at_terminal_floors
 * - test_set_publishes_only_on_change
 * - test_clear_all
 * - test_clear_for_arrival_going_up
 * - test_clear_for_arrival_going_down
 * - test_clear_for_arrival_at_terminal_floors
 * - test_negative_floors
 * - test_floor_range_at_i32_bounds
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod signals_tests {
    use crate::elevator::notifications::{Notification, NotificationBus};
    use crate::elevator::signals::SignalRegistry;
    use crate::shared::SignalKind::{CabinRequest, CallDown, CallUp};
    use crate::shared::{ControllerError, Direction, FloorRange};
    use crossbeam_channel::Receiver;
    use std::sync::Arc;

    fn setup_registry(first: i32, last: i32) -> (SignalRegistry, Receiver<Notification>) {
        let bus = Arc::new(NotificationBus::new());
        let (_id, notification_rx) = bus.subscribe_channel();
        let registry = SignalRegistry::new(FloorRange::new(first, last).unwrap(), bus);
        (registry, notification_rx)
    }

    #[test]
    fn test_signals_start_cleared() {
        let (registry, _notification_rx) = setup_registry(0, 10);

        assert!(!registry.any_set());
        assert_eq!(registry.values(CabinRequest).len(), 11);
        assert_eq!(registry.values(CallUp).len(), 10);
        assert_eq!(registry.values(CallDown).len(), 10);
    }

    #[test]
    fn test_set_get_round_trip() {
        // Purpose: every kind toggles independently on every interior floor

        // Arrange
        let (registry, _notification_rx) = setup_registry(0, 10);

        for floor in 1..10 {
            for kind in [CabinRequest, CallUp, CallDown] {
                // Act
                registry.set(kind, floor, true).unwrap();

                // Assert
                assert!(registry.get(kind, floor).unwrap());
                for other in [CabinRequest, CallUp, CallDown] {
                    if other != kind {
                        assert!(!registry.get(other, floor).unwrap());
                    }
                }

                registry.set(kind, floor, false).unwrap();
                assert!(!registry.get(kind, floor).unwrap());
            }
        }
    }

    #[test]
    fn test_hall_calls_missing_at_terminal_floors() {
        let (registry, notification_rx) = setup_registry(0, 10);

        assert_eq!(
            registry.set(CallUp, 10, true),
            Err(ControllerError::OutOfRange { kind: CallUp, floor: 10 })
        );
        assert_eq!(
            registry.set(CallDown, 0, true),
            Err(ControllerError::OutOfRange { kind: CallDown, floor: 0 })
        );
        assert!(registry.get(CabinRequest, 11).is_err());
        assert!(registry.get(CabinRequest, -1).is_err());

        // Slots that do not exist read as unset
        assert!(!registry.is_set(CallUp, 10));
        assert!(!registry.any_set());
        assert!(notification_rx.try_recv().is_err());
    }

    #[test]
    fn test_set_publishes_only_on_change() {
        // Arrange
        let (registry, notification_rx) = setup_registry(0, 10);

        // Act
        assert_eq!(registry.set(CallUp, 4, true), Ok(false));
        assert_eq!(registry.set(CallUp, 4, true), Ok(true));

        // Assert
        assert_eq!(
            notification_rx.try_recv().unwrap(),
            Notification::SignalChanged { kind: CallUp, floor: 4, old: false, new: true }
        );
        assert!(notification_rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_all() {
        // Arrange
        let (registry, notification_rx) = setup_registry(0, 10);
        registry.set(CabinRequest, 3, true).unwrap();
        registry.set(CallUp, 0, true).unwrap();
        registry.set(CallDown, 10, true).unwrap();
        let _ = notification_rx.try_iter().count();

        // Act
        registry.clear_all();

        // Assert
        assert!(!registry.any_set());
        let names: Vec<String> = notification_rx.try_iter().map(|n| n.property_name()).collect();
        assert_eq!(names, vec!["cabinRequest3", "callUp0", "callDown10"]);
    }

    #[test]
    fn test_clear_for_arrival_going_up() {
        // Arrange
        let (registry, _notification_rx) = setup_registry(0, 10);
        registry.set(CabinRequest, 5, true).unwrap();
        registry.set(CallUp, 5, true).unwrap();
        registry.set(CallDown, 5, true).unwrap();

        // Act
        registry.clear_for_arrival(5, Direction::Up);

        // Assert
        assert!(!registry.get(CabinRequest, 5).unwrap());
        assert!(!registry.get(CallUp, 5).unwrap());
        assert!(registry.get(CallDown, 5).unwrap());
    }

    #[test]
    fn test_clear_for_arrival_going_down() {
        let (registry, _notification_rx) = setup_registry(0, 10);
        registry.set(CabinRequest, 5, true).unwrap();
        registry.set(CallUp, 5, true).unwrap();
        registry.set(CallDown, 5, true).unwrap();

        registry.clear_for_arrival(5, Direction::Down);

        assert!(!registry.get(CabinRequest, 5).unwrap());
        assert!(registry.get(CallUp, 5).unwrap());
        assert!(!registry.get(CallDown, 5).unwrap());
    }

    #[test]
    fn test_clear_for_arrival_at_terminal_floors() {
        // Purpose: the hall call that does not match the direction survives, even at the ends
        let (registry, _notification_rx) = setup_registry(0, 10);
        registry.set(CabinRequest, 10, true).unwrap();
        registry.set(CallDown, 10, true).unwrap();
        registry.set(CallUp, 0, true).unwrap();

        registry.clear_for_arrival(10, Direction::Up);
        registry.clear_for_arrival(0, Direction::Down);

        assert!(!registry.get(CabinRequest, 10).unwrap());
        assert!(registry.get(CallDown, 10).unwrap());
        assert!(registry.get(CallUp, 0).unwrap());
    }

    #[test]
    fn test_negative_floors() {
        let (registry, _notification_rx) = setup_registry(-3, 2);

        registry.set(CallDown, -2, true).unwrap();
        registry.set(CallUp, -3, true).unwrap();

        assert!(registry.get(CallDown, -2).unwrap());
        assert!(registry.get(CallUp, -3).unwrap());
        assert!(registry.get(CallDown, -3).is_err());
        assert_eq!(registry.values(CallDown), vec![true, false, false, false, false]);
        assert_eq!(registry.values(CallUp), vec![true, false, false, false, false]);
    }

    #[test]
    fn test_floor_range_at_i32_bounds() {
        // Arrange
        let widest = FloorRange::new(i32::MIN, i32::MAX).unwrap();
        let (registry, _notification_rx) = setup_registry(i32::MAX - 2, i32::MAX);
        let range = registry.range();

        // Assert
        assert_eq!(widest.len(), u32::MAX as usize + 1);
        assert_eq!(widest.offset(i32::MAX), u32::MAX as usize);
        assert_eq!(widest.next(i32::MAX, Direction::Up), None);
        assert_eq!(widest.next(i32::MIN, Direction::Down), None);

        assert_eq!(range.len(), 3);
        assert_eq!(range.next(i32::MAX - 1, Direction::Up), Some(i32::MAX));
        assert_eq!(range.next(i32::MAX - 2, Direction::Down), None);
        registry.set(CabinRequest, i32::MAX, true).unwrap();
        assert!(registry.get(CabinRequest, i32::MAX).unwrap());
        assert_eq!(
            registry.get(CallUp, i32::MAX),
            Err(ControllerError::OutOfRange {
                kind: CallUp,
                floor: i32::MAX
            })
        );
    }
}
