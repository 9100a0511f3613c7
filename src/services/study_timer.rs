use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

/// Monotonic study-time counter. Starts from a restored elapsed value, ticks
/// once per second while running, and publishes snapshots over a `watch`
/// channel so only subscribers re-render per tick. The tick task stops when
/// the timer is dropped.
pub struct StudyTimer {
    inner: Arc<Mutex<TimerInner>>,
    elapsed_rx: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

struct TimerInner {
    base_secs: u64,
    started_at: Option<Instant>,
}

impl TimerInner {
    fn elapsed_secs(&self) -> u64 {
        let running = self
            .started_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        self.base_secs + running
    }
}

impl StudyTimer {
    /// Start ticking from `restored_secs` of prior study time.
    pub fn start(restored_secs: u64) -> Self {
        let inner = Arc::new(Mutex::new(TimerInner {
            base_secs: restored_secs,
            started_at: Some(Instant::now()),
        }));
        let (elapsed_tx, elapsed_rx) = watch::channel(restored_secs);

        let tick_inner = Arc::clone(&inner);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let secs = tick_inner.lock().expect("timer lock poisoned").elapsed_secs();
                if elapsed_tx.send(secs).is_err() {
                    break;
                }
            }
        });

        StudyTimer {
            inner,
            elapsed_rx,
            handle,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.inner.lock().expect("timer lock poisoned").elapsed_secs()
    }

    /// Snapshot subscription; receivers see one update per second.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed_rx.clone()
    }

    /// Fold the running stretch into the base and stop counting.
    pub fn pause(&self) {
        let mut inner = self.inner.lock().expect("timer lock poisoned");
        if let Some(started_at) = inner.started_at.take() {
            inner.base_secs += started_at.elapsed().as_secs();
        }
    }

    pub fn resume(&self) {
        let mut inner = self.inner.lock().expect("timer lock poisoned");
        if inner.started_at.is_none() {
            inner.started_at = Some(Instant::now());
        }
    }

    /// Overwrite the counter, e.g. from a peer's initial sync. Keeps the
    /// running/paused state.
    pub fn sync_to(&self, elapsed_secs: u64) {
        let mut inner = self.inner.lock().expect("timer lock poisoned");
        inner.base_secs = elapsed_secs;
        if inner.started_at.is_some() {
            inner.started_at = Some(Instant::now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .expect("timer lock poisoned")
            .started_at
            .is_some()
    }
}

impl Drop for StudyTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
