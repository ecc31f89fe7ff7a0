//! Announcement task scheduling
//!
//! Keeps one armed timer per announcement kind (daily, weekly on
//! Monday, monthly on the 1st). Every fire recomputes the next instant
//! from the rule and the current settings rather than adding a fixed
//! interval, so a settings change, a DST transition, or a short month
//! can never walk the schedule off its rule.
//!
//! A per-slot generation counter guards against stale fires: any
//! reconfigure bumps the generation and cancels the old timer, and a
//! fire whose generation no longer matches is dropped. Failures inside
//! one announcement are logged and never stop that task, or its
//! siblings, from being re-armed.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Planning failures re-arm themselves after a retry delay
//! - 1.0.0: Generation-guarded slots over one-shot timers

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};
use tokio::sync::Mutex;

use super::error::{BirthdayError, Result};
use super::recurrence;
use super::store::{AnnouncementSettings, BirthdayStore};
use super::timer::{TimerArmer, TimerHandle};

const DEFAULT_RETRY_DELAY_SECS: i64 = 300;

type BoxedFire = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The three announcement cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Daily,
    Weekly,
    Monthly,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Daily, TaskKind::Weekly, TaskKind::Monthly];

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Daily => "daily",
            TaskKind::Weekly => "weekly",
            TaskKind::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskKind {
    type Err = BirthdayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(TaskKind::Daily),
            "week" | "weekly" => Ok(TaskKind::Weekly),
            "month" | "monthly" => Ok(TaskKind::Monthly),
            other => Err(BirthdayError::Scheduling(format!(
                "unknown announcement kind {other:?}"
            ))),
        }
    }
}

/// Where a task slot currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Unarmed,
    Armed,
    Fired,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskState::Unarmed => "unarmed",
            TaskState::Armed => "armed",
            TaskState::Fired => "fired",
        })
    }
}

/// Snapshot of one slot, for status displays.
#[derive(Debug, Clone)]
pub struct TaskOverview {
    pub kind: TaskKind,
    pub state: TaskState,
    pub next_fire: Option<DateTime<Utc>>,
}

/// Receives fires. The production implementation posts announcements;
/// tests substitute recorders.
#[async_trait]
pub trait FireHandler: Send + Sync {
    async fn on_fire(&self, kind: TaskKind, settings: AnnouncementSettings) -> Result<()>;
}

#[derive(Default)]
struct TaskSlot {
    state: TaskState,
    generation: u64,
    next_fire: Option<DateTime<Utc>>,
    handle: Option<TimerHandle>,
}

#[derive(Default)]
struct SlotTable {
    daily: TaskSlot,
    weekly: TaskSlot,
    monthly: TaskSlot,
}

impl SlotTable {
    fn slot(&self, kind: TaskKind) -> &TaskSlot {
        match kind {
            TaskKind::Daily => &self.daily,
            TaskKind::Weekly => &self.weekly,
            TaskKind::Monthly => &self.monthly,
        }
    }

    fn slot_mut(&mut self, kind: TaskKind) -> &mut TaskSlot {
        match kind {
            TaskKind::Daily => &mut self.daily,
            TaskKind::Weekly => &mut self.weekly,
            TaskKind::Monthly => &mut self.monthly,
        }
    }
}

struct SchedulerInner {
    store: Arc<BirthdayStore>,
    handler: Arc<dyn FireHandler>,
    armer: TimerArmer,
    retry_delay: Duration,
    slots: Mutex<SlotTable>,
}

/// Drives the three announcement tasks. Cheap to clone; all clones
/// share the same slot table.
#[derive(Clone)]
pub struct BirthdayScheduler {
    inner: Arc<SchedulerInner>,
}

impl BirthdayScheduler {
    pub fn new(store: Arc<BirthdayStore>, handler: Arc<dyn FireHandler>) -> Self {
        Self::with_timing(
            store,
            handler,
            TimerArmer::new(),
            Duration::seconds(DEFAULT_RETRY_DELAY_SECS),
        )
    }

    /// Constructor with explicit timer and retry delay, for tests that
    /// need millisecond-scale timing.
    pub fn with_timing(
        store: Arc<BirthdayStore>,
        handler: Arc<dyn FireHandler>,
        armer: TimerArmer,
        retry_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                handler,
                armer,
                retry_delay,
                slots: Mutex::new(SlotTable::default()),
            }),
        }
    }

    /// Arms all three tasks. Safe to call repeatedly; existing timers
    /// are cancelled and replaced.
    pub async fn start(&self) {
        info!("starting birthday announcement scheduler");
        self.reconfigure().await;
    }

    /// Recomputes and re-arms every task from current settings. Called
    /// after any settings mutation.
    pub async fn reconfigure(&self) {
        for kind in TaskKind::ALL {
            self.rearm(kind).await;
        }
    }

    /// Runs one announcement immediately, without touching the armed
    /// timers or their schedule.
    pub async fn force_fire(&self, kind: TaskKind) -> Result<()> {
        let settings = self.inner.store.settings_snapshot();
        info!("🔔 forced {kind} announcement");
        self.inner.handler.on_fire(kind, settings).await
    }

    pub async fn overview(&self) -> Vec<TaskOverview> {
        let slots = self.inner.slots.lock().await;
        TaskKind::ALL
            .iter()
            .map(|kind| {
                let slot = slots.slot(*kind);
                TaskOverview {
                    kind: *kind,
                    state: slot.state,
                    next_fire: slot.next_fire,
                }
            })
            .collect()
    }

    /// Cancels all timers. Armed fires that already started still
    /// finish; their rearm will be dropped as stale.
    pub async fn shutdown(&self) {
        let mut slots = self.inner.slots.lock().await;
        for kind in TaskKind::ALL {
            let slot = slots.slot_mut(kind);
            if let Some(handle) = slot.handle.take() {
                handle.cancel();
            }
            slot.generation += 1;
            slot.state = TaskState::Unarmed;
            slot.next_fire = None;
        }
        info!("birthday announcement scheduler stopped");
    }

    // Boxed return type: the armed fire awaits back into this fn, and
    // a recursive `async fn` future cannot carry the `Send` bound.
    fn rearm(&self, kind: TaskKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let settings = self.inner.store.settings_snapshot();
            let now = Utc::now();
            let computed = next_fire_instant(kind, now, &settings);

            let mut slots = self.inner.slots.lock().await;
            let slot = slots.slot_mut(kind);
            if let Some(handle) = slot.handle.take() {
                handle.cancel();
            }
            slot.generation += 1;
            let generation = slot.generation;

            match computed {
                Ok(at) => {
                    info!("⏰ {kind} announcement armed for {at}");
                    let scheduler = self.clone();
                    let handle = self.inner.armer.arm(at, move || -> BoxedFire {
                        Box::pin(async move { scheduler.handle_fire(kind, generation).await })
                    });
                    slot.state = TaskState::Armed;
                    slot.next_fire = Some(at);
                    slot.handle = Some(handle);
                }
                Err(err) => {
                    error!("failed to plan {kind} announcement: {err}");
                    let retry_at = now + self.inner.retry_delay;
                    let scheduler = self.clone();
                    let handle = self.inner.armer.arm(retry_at, move || -> BoxedFire {
                        Box::pin(async move { scheduler.handle_retry(kind, generation).await })
                    });
                    slot.state = TaskState::Unarmed;
                    slot.next_fire = None;
                    slot.handle = Some(handle);
                }
            }
        })
    }

    async fn handle_fire(&self, kind: TaskKind, generation: u64) {
        {
            let mut slots = self.inner.slots.lock().await;
            let slot = slots.slot_mut(kind);
            if slot.generation != generation {
                debug!(
                    "dropping stale {kind} fire (generation {generation}, current {})",
                    slot.generation
                );
                return;
            }
            slot.state = TaskState::Fired;
            slot.handle = None;
        }

        let settings = self.inner.store.settings_snapshot();
        info!("🔔 {kind} announcement firing");
        if let Err(err) = self.inner.handler.on_fire(kind, settings).await {
            error!("{kind} announcement failed: {err}");
        }

        // A reconfigure or shutdown during the announcement owns the
        // slot now; its generation bump makes this rearm stale.
        {
            let slots = self.inner.slots.lock().await;
            if slots.slot(kind).generation != generation {
                debug!("skipping rearm of {kind}; slot was reconfigured mid-fire");
                return;
            }
        }
        self.rearm(kind).await;
    }

    async fn handle_retry(&self, kind: TaskKind, generation: u64) {
        {
            let slots = self.inner.slots.lock().await;
            if slots.slot(kind).generation != generation {
                return;
            }
        }
        debug!("retrying {kind} announcement planning");
        self.rearm(kind).await;
    }
}

fn next_fire_instant(
    kind: TaskKind,
    now: DateTime<Utc>,
    settings: &AnnouncementSettings,
) -> Result<DateTime<Utc>> {
    match kind {
        TaskKind::Daily => {
            recurrence::next_daily(now, settings.hour, settings.minute, settings.timezone)
        }
        TaskKind::Weekly => {
            recurrence::next_weekly(now, settings.hour, settings.minute, settings.timezone)
        }
        TaskKind::Monthly => {
            recurrence::next_monthly(now, settings.hour, settings.minute, settings.timezone)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingHandler {
        fires: StdMutex<Vec<TaskKind>>,
        fail_kind: Option<TaskKind>,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fires: StdMutex::new(Vec::new()),
                fail_kind: None,
            })
        }

        fn failing_on(kind: TaskKind) -> Arc<Self> {
            Arc::new(Self {
                fires: StdMutex::new(Vec::new()),
                fail_kind: Some(kind),
            })
        }

        fn fired(&self) -> Vec<TaskKind> {
            self.fires.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FireHandler for RecordingHandler {
        async fn on_fire(&self, kind: TaskKind, _settings: AnnouncementSettings) -> Result<()> {
            self.fires.lock().unwrap().push(kind);
            if self.fail_kind == Some(kind) {
                return Err(BirthdayError::Delivery("handler under test".into()));
            }
            Ok(())
        }
    }

    struct SlowHandler {
        delay: std::time::Duration,
    }

    #[async_trait]
    impl FireHandler for SlowHandler {
        async fn on_fire(&self, _kind: TaskKind, _settings: AnnouncementSettings) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> Arc<BirthdayStore> {
        Arc::new(BirthdayStore::load(dir.path()).unwrap())
    }

    async fn generation_of(scheduler: &BirthdayScheduler, kind: TaskKind) -> u64 {
        scheduler.inner.slots.lock().await.slot(kind).generation
    }

    #[tokio::test]
    async fn test_reconfigure_arms_all_three_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = BirthdayScheduler::new(store_in(&dir), RecordingHandler::new());
        scheduler.reconfigure().await;

        let now = Utc::now();
        for task in scheduler.overview().await {
            assert_eq!(task.state, TaskState::Armed, "{} not armed", task.kind);
            let next = task.next_fire.expect("armed task has a next instant");
            assert!(next > now, "{} armed in the past", task.kind);
        }
    }

    #[tokio::test]
    async fn test_scheduler_futures_stay_send() {
        // The rearm/fire recursion must stay spawnable on the
        // multi-threaded runtime.
        fn spawnable<F: Future + Send>(fut: F) -> F {
            fut
        }

        let dir = tempfile::tempdir().unwrap();
        let scheduler = BirthdayScheduler::new(store_in(&dir), RecordingHandler::new());
        spawnable(scheduler.reconfigure()).await;
        spawnable(scheduler.shutdown()).await;
    }

    #[tokio::test]
    async fn test_reconfigure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = BirthdayScheduler::new(store_in(&dir), RecordingHandler::new());
        scheduler.reconfigure().await;
        let first: Vec<_> = scheduler
            .overview()
            .await
            .into_iter()
            .map(|t| t.next_fire)
            .collect();

        scheduler.reconfigure().await;
        let second: Vec<_> = scheduler
            .overview()
            .await
            .into_iter()
            .map(|t| t.next_fire)
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_time_change_moves_the_daily_instant() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let scheduler = BirthdayScheduler::new(store.clone(), RecordingHandler::new());
        scheduler.reconfigure().await;

        store.set_time("23:45").unwrap();
        scheduler.reconfigure().await;

        let overview = scheduler.overview().await;
        let daily = overview
            .iter()
            .find(|t| t.kind == TaskKind::Daily)
            .unwrap();
        let expected =
            recurrence::next_daily(Utc::now(), 23, 45, chrono_tz::Tz::UTC).unwrap();
        assert_eq!(daily.next_fire, Some(expected));
    }

    #[tokio::test]
    async fn test_fire_runs_handler_and_rearms() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::new();
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler.clone());
        scheduler.reconfigure().await;

        let generation = generation_of(&scheduler, TaskKind::Daily).await;
        scheduler.handle_fire(TaskKind::Daily, generation).await;

        assert_eq!(handler.fired(), vec![TaskKind::Daily]);
        let overview = scheduler.overview().await;
        let daily = overview
            .iter()
            .find(|t| t.kind == TaskKind::Daily)
            .unwrap();
        assert_eq!(daily.state, TaskState::Armed);
        assert!(generation_of(&scheduler, TaskKind::Daily).await > generation);
    }

    #[tokio::test]
    async fn test_stale_fire_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::new();
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler.clone());
        scheduler.reconfigure().await;

        let stale = generation_of(&scheduler, TaskKind::Daily).await;
        scheduler.reconfigure().await; // bumps the generation
        scheduler.handle_fire(TaskKind::Daily, stale).await;

        assert!(handler.fired().is_empty());
    }

    #[tokio::test]
    async fn test_failed_handler_still_rearms_and_spares_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::failing_on(TaskKind::Daily);
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler.clone());
        scheduler.reconfigure().await;

        let weekly_generation = generation_of(&scheduler, TaskKind::Weekly).await;
        let monthly_generation = generation_of(&scheduler, TaskKind::Monthly).await;

        let generation = generation_of(&scheduler, TaskKind::Daily).await;
        scheduler.handle_fire(TaskKind::Daily, generation).await;

        assert_eq!(handler.fired(), vec![TaskKind::Daily]);
        let overview = scheduler.overview().await;
        let daily = overview
            .iter()
            .find(|t| t.kind == TaskKind::Daily)
            .unwrap();
        assert_eq!(daily.state, TaskState::Armed, "failure must not unarm");
        assert_eq!(
            generation_of(&scheduler, TaskKind::Weekly).await,
            weekly_generation
        );
        assert_eq!(
            generation_of(&scheduler, TaskKind::Monthly).await,
            monthly_generation
        );
    }

    #[tokio::test]
    async fn test_force_fire_leaves_timers_alone() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::new();
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler.clone());
        scheduler.reconfigure().await;

        let before: Vec<_> = scheduler
            .overview()
            .await
            .into_iter()
            .map(|t| (t.state, t.next_fire))
            .collect();

        scheduler.force_fire(TaskKind::Weekly).await.unwrap();

        assert_eq!(handler.fired(), vec![TaskKind::Weekly]);
        let after: Vec<_> = scheduler
            .overview()
            .await
            .into_iter()
            .map(|t| (t.state, t.next_fire))
            .collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_force_fire_reports_handler_failure() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RecordingHandler::failing_on(TaskKind::Monthly);
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler.clone());

        let err = scheduler.force_fire(TaskKind::Monthly).await.unwrap_err();
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_shutdown_during_fire_stays_unarmed() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(SlowHandler {
            delay: std::time::Duration::from_millis(200),
        });
        let scheduler = BirthdayScheduler::new(store_in(&dir), handler);
        scheduler.reconfigure().await;

        let generation = generation_of(&scheduler, TaskKind::Daily).await;
        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.handle_fire(TaskKind::Daily, generation).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        scheduler.shutdown().await;
        running.await.unwrap();

        let overview = scheduler.overview().await;
        let daily = overview.iter().find(|t| t.kind == TaskKind::Daily).unwrap();
        assert_eq!(daily.state, TaskState::Unarmed, "fire rearmed after shutdown");
    }

    #[tokio::test]
    async fn test_shutdown_unarms_everything() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = BirthdayScheduler::new(store_in(&dir), RecordingHandler::new());
        scheduler.reconfigure().await;
        scheduler.shutdown().await;

        for task in scheduler.overview().await {
            assert_eq!(task.state, TaskState::Unarmed);
            assert_eq!(task.next_fire, None);
        }
    }

    #[test]
    fn test_task_kind_round_trip() {
        assert_eq!("day".parse::<TaskKind>().unwrap(), TaskKind::Daily);
        assert_eq!("WEEK".parse::<TaskKind>().unwrap(), TaskKind::Weekly);
        assert_eq!("monthly".parse::<TaskKind>().unwrap(), TaskKind::Monthly);
        assert!("fortnight".parse::<TaskKind>().is_err());
        assert_eq!(TaskKind::Daily.to_string(), "daily");
    }
}
