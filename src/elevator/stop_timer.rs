/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;
use std::sync::Weak;
use std::thread::{Builder, JoinHandle};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::ControllerError;

/// Receiver of expired pauses. Implemented by the controller.
pub trait PauseHandler: Send + Sync {
    /// Called once per scheduled stop, on the timer thread.
    fn pause_elapsed(&self, sequence: u64);
}

/// A single pending stop. Fired once, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledStop {
    deadline: Instant,
    sequence: u64,
}

/**
 * Deferred stop handler.
 *
 * Owns the sending half of the schedule channel. A dedicated `stop_timer` thread waits for
 * deadlines and hands each expired stop to the `PauseHandler`, on its own thread rather than
 * on the one that scheduled it. Stops are never cancelled: the handler has to check on
 * delivery whether the stop is still relevant. Dropping the `StopTimer` ends the thread.
 */
pub struct StopTimer {
    schedule_tx: cbc::Sender<ScheduledStop>,
}

/// Receiving half of a `StopTimer`, not running until spawned.
pub struct StopTimerWorker {
    schedule_rx: cbc::Receiver<ScheduledStop>,
}

impl StopTimer {
    pub fn new() -> (StopTimer, StopTimerWorker) {
        let (schedule_tx, schedule_rx) = cbc::unbounded::<ScheduledStop>();
        (StopTimer { schedule_tx }, StopTimerWorker { schedule_rx })
    }

    pub fn schedule(&self, pause: Duration, sequence: u64) -> Result<(), ControllerError> {
        let stop = ScheduledStop {
            deadline: Instant::now() + pause,
            sequence,
        };

        debug!("Scheduling stop #{} in {:?}", sequence, pause);
        self.schedule_tx.send(stop).map_err(|_| {
            error!("Stop timer thread is gone, stop #{} was not scheduled", sequence);
            ControllerError::TimerUnavailable
        })
    }
}

impl StopTimerWorker {
    /// Starts the `stop_timer` thread delivering expired stops to `handler`.
    pub fn spawn(self, handler: Weak<dyn PauseHandler>) -> io::Result<JoinHandle<()>> {
        let schedule_rx = self.schedule_rx;
        Builder::new()
            .name("stop_timer".into())
            .spawn(move || run(handler, schedule_rx))
    }
}

fn run(handler: Weak<dyn PauseHandler>, schedule_rx: cbc::Receiver<ScheduledStop>) {
    let mut pending: BinaryHeap<Reverse<ScheduledStop>> = BinaryHeap::new();

    loop {
        let next_deadline = pending.peek().map(|Reverse(stop)| stop.deadline);

        match next_deadline {
            None => match schedule_rx.recv() {
                Ok(stop) => pending.push(Reverse(stop)),
                Err(_) => break,
            },
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                cbc::select! {
                    recv(schedule_rx) -> stop => {
                        match stop {
                            Ok(stop) => pending.push(Reverse(stop)),
                            Err(_) => break,
                        }
                    }
                    default(timeout) => {}
                }
            }
        }

        // Fire everything that is due, oldest deadline first
        while let Some(Reverse(stop)) = pending.peek().copied() {
            if stop.deadline > Instant::now() {
                break;
            }
            pending.pop();

            match handler.upgrade() {
                Some(handler) => handler.pause_elapsed(stop.sequence),
                None => {
                    debug!("Pause handler dropped, stop timer exiting");
                    return;
                }
            }
        }
    }

    debug!("Stop timer channel closed, {} pending stop(s) discarded", pending.len());
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod stop_timer_tests {
    use super::*;
    use std::sync::Arc;

    struct Recorder {
        fired_tx: cbc::Sender<u64>,
    }

    impl PauseHandler for Recorder {
        fn pause_elapsed(&self, sequence: u64) {
            self.fired_tx.send(sequence).unwrap();
        }
    }

    fn setup_timer() -> (StopTimer, Arc<Recorder>, cbc::Receiver<u64>, JoinHandle<()>) {
        let (fired_tx, fired_rx) = cbc::unbounded::<u64>();
        let recorder = Arc::new(Recorder { fired_tx });
        let (stop_timer, worker) = StopTimer::new();
        let handler: Weak<Recorder> = Arc::downgrade(&recorder);
        let handle = worker.spawn(handler).unwrap();
        (stop_timer, recorder, fired_rx, handle)
    }

    #[test]
    fn test_fires_after_pause() {
        // Arrange
        let (stop_timer, _recorder, fired_rx, _handle) = setup_timer();
        let scheduled = Instant::now();

        // Act
        stop_timer.schedule(Duration::from_millis(50), 1).unwrap();

        // Assert
        assert_eq!(fired_rx.recv_timeout(Duration::from_secs(3)), Ok(1));
        assert!(scheduled.elapsed() >= Duration::from_millis(50));
        assert!(fired_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let (stop_timer, _recorder, fired_rx, _handle) = setup_timer();

        stop_timer.schedule(Duration::from_millis(200), 1).unwrap();
        stop_timer.schedule(Duration::from_millis(20), 2).unwrap();

        assert_eq!(fired_rx.recv_timeout(Duration::from_secs(3)), Ok(2));
        assert_eq!(fired_rx.recv_timeout(Duration::from_secs(3)), Ok(1));
    }

    #[test]
    fn test_fires_on_timer_thread() {
        struct ThreadName {
            name_tx: cbc::Sender<Option<String>>,
        }

        impl PauseHandler for ThreadName {
            fn pause_elapsed(&self, _sequence: u64) {
                let name = std::thread::current().name().map(str::to_string);
                self.name_tx.send(name).unwrap();
            }
        }

        let (name_tx, name_rx) = cbc::unbounded();
        let handler = Arc::new(ThreadName { name_tx });
        let (stop_timer, worker) = StopTimer::new();
        let weak: Weak<ThreadName> = Arc::downgrade(&handler);
        worker.spawn(weak).unwrap();

        stop_timer.schedule(Duration::ZERO, 1).unwrap();

        assert_eq!(
            name_rx.recv_timeout(Duration::from_secs(3)),
            Ok(Some("stop_timer".to_string()))
        );
    }

    #[test]
    fn test_thread_ends_when_timer_dropped() {
        let (stop_timer, _recorder, _fired_rx, handle) = setup_timer();
        stop_timer.schedule(Duration::from_secs(60), 1).unwrap();

        drop(stop_timer);

        handle.join().unwrap();
    }

    #[test]
    fn test_thread_ends_when_handler_dropped() {
        let (stop_timer, recorder, _fired_rx, handle) = setup_timer();

        drop(recorder);
        stop_timer.schedule(Duration::ZERO, 1).unwrap();

        handle.join().unwrap();
        assert_eq!(
            stop_timer.schedule(Duration::ZERO, 2),
            Err(ControllerError::TimerUnavailable)
        );
    }
}
