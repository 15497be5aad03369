use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::error::{SlotBookingError, LOAD_SLOTS_FAILED};
use crate::models::{DaySlots, PollMode, RefreshOutcome};
use crate::services::clock::Clock;
use crate::services::date_key::{time_has_passed, to_date_key};
use crate::services::gateway::SlotGateway;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub weeks: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            weeks: 1,
        }
    }
}

impl PollerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            interval: config.slot_poll_interval(),
            weeks: config.slot_query_weeks.max(1),
        }
    }
}

/// Locally downgrades slots of today whose time is at or before `now`.
/// Never upgrades a slot. Returns how many slots were downgraded.
pub fn expire_passed_slots(days: &mut [DaySlots], now: NaiveDateTime) -> usize {
    let today = to_date_key(now.date());
    let mut expired = 0;

    for day in days.iter_mut().filter(|day| day.date == today) {
        for slot in day.slots.iter_mut().filter(|slot| slot.available) {
            if time_has_passed(&day.date, &slot.time, now) {
                slot.available = false;
                slot.disabled_because_time_passed = true;
                expired += 1;
            }
        }
    }

    expired
}

#[derive(Debug, Default)]
struct SlotBoard {
    days: Vec<DaySlots>,
    date_key: Option<String>,
    /// Date of the latest foreground request; background answers for any other date are dropped.
    target: Option<String>,
    loading: bool,
    last_applied: u64,
    last_error: Option<String>,
}

struct PollerInner {
    gateway: Arc<dyn SlotGateway>,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
    board: RwLock<SlotBoard>,
    sequence: AtomicU64,
}

impl PollerInner {
    async fn fetch(&self, date_key: &str, mode: PollMode) -> Result<RefreshOutcome, SlotBookingError> {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        if mode == PollMode::Foreground {
            let mut board = self.board.write().await;
            board.loading = true;
            board.target = Some(date_key.to_string());
        }

        let result = self.gateway.available_slots(date_key, self.config.weeks).await;

        let mut board = self.board.write().await;
        if mode == PollMode::Foreground {
            board.loading = false;
        }

        match result {
            Ok(mut days) => {
                if mode == PollMode::Background && board.target.as_deref().is_some_and(|target| target != date_key) {
                    debug!("Dropping background slot response for {}, now showing {:?}", date_key, board.target);
                    return Ok(RefreshOutcome::Stale);
                }
                if ticket < board.last_applied {
                    debug!("Dropping slot response #{} older than applied #{}", ticket, board.last_applied);
                    return Ok(RefreshOutcome::Stale);
                }

                let expired = expire_passed_slots(&mut days, self.clock.now());
                if expired > 0 {
                    debug!("Marked {} slot(s) on {} as passed", expired, date_key);
                }

                let count = days.len();
                board.days = days;
                board.date_key = Some(date_key.to_string());
                board.last_applied = ticket;
                board.last_error = None;
                Ok(RefreshOutcome::Applied { days: count })
            }
            Err(err) => {
                match mode {
                    PollMode::Foreground => {
                        warn!("Load slots error for {}: {}", date_key, err);
                        board.last_error = Some(err.user_message(LOAD_SLOTS_FAILED));
                    }
                    PollMode::Background => {
                        debug!("Background slot poll for {} failed: {}", date_key, err);
                    }
                }
                Err(SlotBookingError::Gateway(err))
            }
        }
    }
}

/// Keeps the slot board for one booking view fresh.
///
/// Foreground refreshes raise the loading flag and report failures;
/// background ticks are silent. Either way a failure leaves the previous
/// board untouched. At most one background task exists per poller.
pub struct AvailabilityPoller {
    inner: Arc<PollerInner>,
    task: Option<JoinHandle<()>>,
    polled_date: Option<String>,
}

impl AvailabilityPoller {
    pub fn new(gateway: Arc<dyn SlotGateway>, clock: Arc<dyn Clock>, config: PollerConfig) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                gateway,
                clock,
                config,
                board: RwLock::new(SlotBoard::default()),
                sequence: AtomicU64::new(0),
            }),
            task: None,
            polled_date: None,
        }
    }

    pub async fn refresh(&self, date_key: &str, mode: PollMode) -> Result<RefreshOutcome, SlotBookingError> {
        self.inner.fetch(date_key, mode).await
    }

    /// Schedules background polling for `date_key`, cancelling any previous schedule.
    /// The first background tick fires one interval from now.
    pub fn start(&mut self, date_key: &str) {
        self.stop();

        let inner = Arc::clone(&self.inner);
        let key = date_key.to_string();
        let interval = inner.config.interval;

        info!("Polling slots for {} every {:?}", key, interval);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let _ = inner.fetch(&key, PollMode::Background).await;
            }
        }));
        self.polled_date = Some(date_key.to_string());
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Cancelling slot poll for {:?}", self.polled_date);
            task.abort();
        }
        self.polled_date = None;
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn polled_date(&self) -> Option<&str> {
        self.polled_date.as_deref()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.board.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.board.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> Vec<DaySlots> {
        self.inner.board.read().await.days.clone()
    }

    /// Slots for one day as they should be shown right now. The passed-time
    /// check is re-run against the clock so slots expire between polls too.
    pub async fn day_slots(&self, date_key: &str) -> DaySlots {
        let board = self.inner.board.read().await;
        let mut day = board
            .days
            .iter()
            .find(|day| day.date == date_key)
            .cloned()
            .unwrap_or_else(|| DaySlots::empty(date_key));
        drop(board);

        expire_passed_slots(std::slice::from_mut(&mut day), self.inner.clock.now());
        day
    }
}

impl Drop for AvailabilityPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
