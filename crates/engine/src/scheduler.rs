use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// Callback invoked on every timer tick.
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// Identifies one started timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Repeating timer used to drive playhead updates.
pub trait Scheduler {
    /// Starts calling `callback` every `interval` until cancelled.
    fn start(&mut self, interval: Duration, callback: TickCallback) -> TimerHandle;

    /// Stops the timer. No callback for `handle` runs after this returns.
    fn cancel(&mut self, handle: TimerHandle);
}

struct TimerThread {
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

/// Scheduler backed by one sleeping thread per timer.
///
/// Cancelling disconnects the stop channel and joins the thread, so a
/// callback that is already running finishes before `cancel` returns.
#[derive(Default)]
pub struct ThreadScheduler {
    next_id: u64,
    timers: HashMap<TimerHandle, TimerThread>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have not been cancelled.
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }
}

impl std::fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("next_id", &self.next_id)
            .field("active_timers", &self.timers.len())
            .finish()
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, interval: Duration, mut callback: TickCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let join = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => callback(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        debug!(timer = handle.0, interval_ms = interval.as_millis() as u64, "timer started");
        self.timers.insert(handle, TimerThread { stop_tx, join });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let Some(timer) = self.timers.remove(&handle) else {
            return;
        };
        drop(timer.stop_tx);
        if timer.join.join().is_err() {
            warn!(timer = handle.0, "timer callback panicked");
            return;
        }
        debug!(timer = handle.0, "timer cancelled");
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        let handles: Vec<TimerHandle> = self.timers.keys().copied().collect();
        for handle in handles {
            self.cancel(handle);
        }
    }
}

#[derive(Default)]
struct ManualTimers {
    next_id: u64,
    started: usize,
    active: Vec<(TimerHandle, Duration, TickCallback)>,
}

/// Scheduler that never fires on its own; ticks are delivered with
/// [`ManualScheduler::fire`]. Clones share the same timers.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<ManualTimers>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every active callback once. Returns how many ran.
    pub fn fire(&self) -> usize {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, _, callback) in timers.active.iter_mut() {
            callback();
        }
        timers.active.len()
    }

    pub fn active_timers(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .len()
    }

    /// Total number of timers ever started.
    pub fn started_timers(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .started
    }

    /// Interval of the most recently started timer that is still active.
    pub fn active_interval(&self) -> Option<Duration> {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .last()
            .map(|(_, interval, _)| *interval)
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active_timers", &self.active_timers())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, interval: Duration, callback: TickCallback) -> TimerHandle {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = TimerHandle(timers.next_id);
        timers.next_id += 1;
        timers.started += 1;
        timers.active.push((handle, interval, callback));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.active.retain(|(active, _, _)| *active != handle);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    use super::{ManualScheduler, Scheduler, ThreadScheduler};

    #[test]
    fn thread_scheduler_ticks_until_cancelled() {
        let mut scheduler = ThreadScheduler::new();
        let (tick_tx, tick_rx) = mpsc::channel();
        let handle = scheduler.start(
            Duration::from_millis(5),
            Box::new(move || {
                let _ = tick_tx.send(());
            }),
        );

        tick_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("first tick");
        tick_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("second tick");

        scheduler.cancel(handle);
        assert_eq!(scheduler.active_timers(), 0);
        while tick_rx.try_recv().is_ok() {}
        assert!(
            tick_rx.recv_timeout(Duration::from_millis(50)).is_err(),
            "no tick may arrive after cancel returns"
        );
    }

    #[test]
    fn cancelling_unknown_handle_is_a_no_op() {
        let mut scheduler = ThreadScheduler::new();
        let handle = scheduler.start(Duration::from_secs(60), Box::new(|| {}));
        scheduler.cancel(handle);
        scheduler.cancel(handle);
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[test]
    fn cancelling_after_a_panicking_callback_still_removes_the_timer() {
        let mut scheduler = ThreadScheduler::new();
        let (fired_tx, fired_rx) = mpsc::channel();
        let handle = scheduler.start(
            Duration::from_millis(5),
            Box::new(move || {
                let _ = fired_tx.send(());
                panic!("tick callback failed");
            }),
        );

        fired_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("callback should run before cancel");
        scheduler.cancel(handle);
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[test]
    fn manual_scheduler_fires_only_active_timers() {
        let mut scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let first_count = Arc::clone(&count);
        let first = scheduler.start(
            Duration::from_millis(33),
            Box::new(move || {
                first_count.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(scheduler.fire(), 1);
        scheduler.cancel(first);
        assert_eq!(scheduler.fire(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.started_timers(), 1);
    }
}
