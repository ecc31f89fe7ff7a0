//! One-shot timers for far-future instants
//!
//! Sleeps toward a UTC target in capped hops, re-deriving the remaining
//! delay from the clock after every hop. The cap keeps each individual
//! sleep short enough that a fire scheduled weeks out never rests on a
//! single long sleep, and re-deriving absorbs clock drift and DST
//! offset changes between hops.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: Hop-capped one-shot timer with cancel handles

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Longest single sleep. Remaining time beyond this is covered by
/// another hop.
pub const DEFAULT_MAX_HOP: Duration = Duration::from_secs(24 * 60 * 60);

/// Handle to an armed timer. Cancelling is prompt (the sleeping task is
/// woken, not waited out) and idempotent; cancelling after the fire
/// started is a no-op.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Arms one-shot timers on the tokio runtime.
#[derive(Debug, Clone)]
pub struct TimerArmer {
    max_hop: Duration,
}

impl Default for TimerArmer {
    fn default() -> Self {
        Self {
            max_hop: DEFAULT_MAX_HOP,
        }
    }
}

impl TimerArmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shrinks the hop cap. Tests use this to exercise multi-hop waits
    /// in milliseconds.
    pub fn with_max_hop(max_hop: Duration) -> Self {
        Self { max_hop }
    }

    /// Spawns a task that sleeps until `target` and then runs
    /// `callback` exactly once. A target at or before now fires
    /// promptly. The returned handle cancels the wait without running
    /// the callback.
    pub fn arm<F, Fut>(&self, target: DateTime<Utc>, callback: F) -> TimerHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = TimerHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            fired: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        };
        let timer = handle.clone();
        let max_hop = self.max_hop;

        tokio::spawn(async move {
            loop {
                if timer.cancelled.load(Ordering::SeqCst) {
                    return;
                }
                let remaining = match (target - Utc::now()).to_std() {
                    Ok(remaining) if !remaining.is_zero() => remaining,
                    // Zero or already past: stop hopping and fire.
                    _ => break,
                };
                let hop = remaining.min(max_hop);
                debug!("timer sleeping {hop:?} toward {target}");
                tokio::select! {
                    _ = sleep(hop) => {}
                    _ = timer.notify.notified() => return,
                }
            }

            if timer.cancelled.load(Ordering::SeqCst) {
                return;
            }
            if timer
                .fired
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                callback().await;
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::timeout;

    fn counting_callback(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> + Send + 'static {
        let counter = counter.clone();
        move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    async fn wait_for_count(counter: &Arc<AtomicUsize>, want: usize) {
        let poll = async {
            while counter.load(Ordering::SeqCst) < want {
                sleep(Duration::from_millis(20)).await;
            }
        };
        timeout(Duration::from_secs(3), poll)
            .await
            .expect("timer did not fire in time");
    }

    #[tokio::test]
    async fn test_fires_once_across_multiple_hops() {
        let armer = TimerArmer::with_max_hop(Duration::from_millis(100));
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Utc::now() + chrono::Duration::milliseconds(400);
        let handle = armer.arm(target, counting_callback(&counter));

        sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0, "fired before the target");

        wait_for_count(&counter, 1).await;
        assert!(handle.has_fired());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1, "fired more than once");
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let armer = TimerArmer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Utc::now() + chrono::Duration::milliseconds(200);
        let handle = armer.arm(target, counting_callback(&counter));

        handle.cancel();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
        assert!(!handle.has_fired());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let armer = TimerArmer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Utc::now() + chrono::Duration::milliseconds(200);
        let handle = armer.arm(target, counting_callback(&counter));

        handle.cancel();
        handle.cancel();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_fire_is_noop() {
        let armer = TimerArmer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Utc::now() + chrono::Duration::milliseconds(50);
        let handle = armer.arm(target, counting_callback(&counter));

        wait_for_count(&counter, 1).await;
        handle.cancel();
        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_past_target_fires_promptly() {
        let armer = TimerArmer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Utc::now() - chrono::Duration::seconds(5);
        armer.arm(target, counting_callback(&counter));

        wait_for_count(&counter, 1).await;
    }
}
