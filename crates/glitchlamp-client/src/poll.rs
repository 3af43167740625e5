//! Background polling on a dedicated thread.
//!
//! A [`PollTask`] calls its closure once immediately and then every
//! interval until stopped. The thread waits on a channel with a timeout
//! instead of sleeping, so a stop signal never waits out the interval.
//! [`PollTask::cancel`] (and dropping the task) only signals and detaches
//! the thread, so it is safe on the UI thread while a request is in flight;
//! [`PollTask::stop`] also joins, for callers that can afford to block.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::ClientError;

/// Most recent value produced by a poller, shared with the reader.
#[derive(Debug)]
pub struct Latest<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    error: Option<String>,
    updates: u64,
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value: None,
                error: None,
                updates: 0,
            })),
        }
    }
}

impl<T: Clone> Latest<T> {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value and clears the last error.
    pub fn set(&self, value: T) {
        let mut slot = self.slot.lock();
        slot.value = Some(value);
        slot.error = None;
        slot.updates += 1;
    }

    /// Records a failed poll. The previous value is kept.
    pub fn set_error(&self, message: impl Into<String>) {
        self.slot.lock().error = Some(message.into());
    }

    /// Clone of the current value.
    pub fn get(&self) -> Option<T> {
        self.slot.lock().value.clone()
    }

    /// Message of the last failed poll, if the last poll failed.
    pub fn error(&self) -> Option<String> {
        self.slot.lock().error.clone()
    }

    /// Number of successful updates so far.
    pub fn updates(&self) -> u64 {
        self.slot.lock().updates
    }
}

/// A closure run periodically on its own thread.
///
/// Dropping the task cancels it without joining.
#[derive(Debug)]
pub struct PollTask {
    name: String,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PollTask {
    /// Spawns a poller named `name` that calls `tick` every `interval`.
    ///
    /// Thread spawn failure is logged and yields a task that never runs.
    pub fn spawn<F>(name: impl Into<String>, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, stop_rx): (Sender<()>, Receiver<()>) = bounded(1);
        let spawned = std::thread::Builder::new()
            .name(format!("poll-{name}"))
            .spawn(move || {
                loop {
                    tick();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });
        let handle = match spawned {
            Ok(handle) => {
                tracing::debug!(task = %name, ?interval, "poller started");
                Some(handle)
            }
            Err(e) => {
                tracing::error!(task = %name, "failed to spawn poller: {e}");
                None
            }
        };
        Self {
            name,
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    /// Spawns a poller that stores each successful `fetch` in `latest`.
    ///
    /// Failures are logged at debug level, recorded on `latest`, and retried
    /// on the next tick.
    pub fn spawn_fetch<T, F>(
        name: impl Into<String>,
        interval: Duration,
        latest: Latest<T>,
        mut fetch: F,
    ) -> Self
    where
        T: Clone + Send + 'static,
        F: FnMut() -> Result<T, ClientError> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        Self::spawn(name, interval, move || match fetch() {
            Ok(value) => latest.set(value),
            Err(e) => {
                tracing::debug!(task = %task_name, "poll failed: {e}");
                latest.set_error(e.to_string());
            }
        })
    }

    /// Name given at spawn.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the polling thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn signal(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
    }

    /// Signals the poller to stop and returns at once.
    ///
    /// A tick already running finishes on the detached thread, which then
    /// exits without ticking again.
    pub fn cancel(&mut self) {
        self.signal();
        if self.handle.take().is_some() {
            tracing::debug!(task = %self.name, "poller cancelled");
        }
    }

    /// Stops the poller and joins its thread, waiting out a running tick.
    pub fn stop(&mut self) {
        self.signal();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(task = %self.name, "poller panicked");
            } else {
                tracing::debug!(task = %self.name, "poller stopped");
            }
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[test]
    fn ticks_immediately_then_periodically() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let mut task = PollTask::spawn("count", Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(task.is_running());
        task.stop();
        assert!(!task.is_running());
        assert!(count.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn stop_does_not_wait_for_interval() {
        let mut task = PollTask::spawn("slow", Duration::from_secs(60), || {});
        let started = Instant::now();
        task.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_does_not_wait_for_running_tick() {
        let (started_tx, started_rx) = bounded(1);
        let mut task = PollTask::spawn("busy", Duration::from_secs(60), move || {
            let _ = started_tx.try_send(());
            std::thread::sleep(Duration::from_secs(2));
        });
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first tick runs immediately");

        let started = Instant::now();
        task.cancel();
        assert!(started.elapsed() < Duration::from_millis(200));
        assert!(!task.is_running());
    }

    #[test]
    fn fetch_keeps_last_value_on_error() {
        let latest = Latest::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let mut task = PollTask::spawn_fetch("fetch", Duration::from_millis(5), latest.clone(), move || {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(7)
            } else {
                Err(ClientError::InvalidUrl("x".into()))
            }
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        task.stop();
        assert_eq!(latest.get(), Some(7));
        assert_eq!(latest.updates(), 1);
        assert!(latest.error().is_some());
    }
}
