use std::sync::Arc;

use chrono::Weekday;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::error::SlotBookingError;
use crate::models::{
    BookingEntry, BookingResult, DaySlots, ExitNavigation, MonthJump, PollMode, RefreshOutcome, Selection,
};
use crate::services::booking::{BookingOutcome, BookingTransaction};
use crate::services::calendar::{weekday_from_index, CalendarState, GridCells, VisibleMonth, DEFAULT_CLOSED_WEEKDAY};
use crate::services::clock::Clock;
use crate::services::gateway::SlotGateway;
use crate::services::poller::{AvailabilityPoller, PollerConfig};
use crate::services::selection::SlotSelection;

#[derive(Debug, Clone)]
pub struct BookingViewConfig {
    pub poller: PollerConfig,
    pub closed_weekday: Weekday,
}

impl Default for BookingViewConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            closed_weekday: DEFAULT_CLOSED_WEEKDAY,
        }
    }
}

impl BookingViewConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poller: PollerConfig::from_app_config(config),
            closed_weekday: weekday_from_index(config.closed_weekday).unwrap_or(DEFAULT_CLOSED_WEEKDAY),
        }
    }
}

/// What `confirm` hands back to the hosting layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReport {
    pub outcome: BookingOutcome,
    pub result: BookingResult,
    pub navigation: Option<ExitNavigation>,
}

/// State owner for one booking screen: calendar, slot board, selection and
/// the booking transaction. Nothing else reads or mutates these.
pub struct SlotBookingView {
    entry: BookingEntry,
    clock: Arc<dyn Clock>,
    calendar: CalendarState,
    poller: AvailabilityPoller,
    selection: SlotSelection,
    booking: BookingTransaction,
    mounted: bool,
}

impl SlotBookingView {
    pub fn new(
        entry: BookingEntry,
        gateway: Arc<dyn SlotGateway>,
        clock: Arc<dyn Clock>,
        config: BookingViewConfig,
    ) -> Self {
        let calendar = CalendarState::new(clock.today(), config.closed_weekday);
        let poller = AvailabilityPoller::new(Arc::clone(&gateway), Arc::clone(&clock), config.poller);

        Self {
            entry,
            clock,
            calendar,
            poller,
            selection: SlotSelection::new(),
            booking: BookingTransaction::new(gateway),
            mounted: false,
        }
    }

    pub fn entry(&self) -> &BookingEntry {
        &self.entry
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn calendar(&self) -> &CalendarState {
        &self.calendar
    }

    pub fn visible_month(&self) -> VisibleMonth {
        self.calendar.visible_month()
    }

    pub fn selected_date_key(&self) -> String {
        self.calendar.selected_key()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.current()
    }

    pub fn is_booking(&self) -> bool {
        self.booking.is_pending()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    pub async fn is_loading(&self) -> bool {
        self.poller.is_loading().await
    }

    pub async fn load_error(&self) -> Option<String> {
        self.poller.last_error().await
    }

    /// Loads slots for the highlighted day and starts background polling.
    /// Polling starts even when the first load fails; the load error is returned.
    pub async fn mount(&mut self) -> Result<RefreshOutcome, SlotBookingError> {
        info!(
            "Opening slot booking for patient {} ({})",
            self.entry.patient_id, self.entry.patient_name
        );
        self.mounted = true;
        self.reload_selected_day().await
    }

    pub fn unmount(&mut self) {
        if self.mounted {
            debug!("Closing slot booking for patient {}", self.entry.patient_id);
        }
        self.poller.stop();
        self.mounted = false;
    }

    pub fn calendar_cells(&self) -> GridCells {
        self.calendar.cells(self.clock.today())
    }

    /// Returns `Ok(false)` when the day is past or closed and nothing changed.
    pub async fn select_date(&mut self, date_key: &str) -> Result<bool, SlotBookingError> {
        self.ensure_mounted()?;

        if !self.calendar.select_date(date_key, self.clock.today())? {
            return Ok(false);
        }

        self.selection.clear();
        self.reload_selected_day().await?;
        Ok(true)
    }

    pub fn previous_month(&mut self) -> bool {
        self.calendar.previous_month(self.clock.today())
    }

    pub fn next_month(&mut self) -> bool {
        self.calendar.next_month()
    }

    pub async fn jump_to_month(&mut self, year: i32, month0: u32) -> Result<MonthJump, SlotBookingError> {
        self.ensure_mounted()?;

        let jump = self.calendar.jump_to(year, month0, self.clock.today());
        if let MonthJump::Moved { selection_reset: true } = jump {
            self.selection.clear();
            self.reload_selected_day().await?;
        }
        Ok(jump)
    }

    /// Manual refresh of the highlighted day, with the loading indicator.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SlotBookingError> {
        self.ensure_mounted()?;
        self.poller
            .refresh(&self.calendar.selected_key(), PollMode::Foreground)
            .await
    }

    pub async fn selected_day(&self) -> DaySlots {
        self.poller.day_slots(&self.calendar.selected_key()).await
    }

    pub async fn select_slot(&mut self, time: &str) -> Result<Selection, SlotBookingError> {
        self.ensure_mounted()?;

        let day = self.selected_day().await;
        let selection = self.selection.select(&day, time, self.clock.now())?;
        Ok(selection.clone())
    }

    /// Runs the booking transaction for the current selection. On full or
    /// partial success the selection is cleared and the view unmounts; on
    /// failure everything stays as it was so the user can retry.
    pub async fn confirm(&mut self) -> Result<BookingReport, SlotBookingError> {
        self.ensure_mounted()?;

        let selection = self.selection.current().cloned().ok_or(SlotBookingError::NoSelection)?;
        let outcome = self
            .booking
            .book_slot(&selection, &self.entry.patient_id, &self.entry.doctor_id)
            .await?;

        let navigation = outcome.exit_navigation(&self.entry.doctor_id);
        if navigation.is_some() {
            self.selection.clear();
            self.unmount();
        } else {
            warn!(
                "Booking {} {} failed: {}",
                selection.date,
                selection.time,
                outcome.user_message()
            );
        }

        Ok(BookingReport {
            result: outcome.result(),
            outcome,
            navigation,
        })
    }

    fn ensure_mounted(&self) -> Result<(), SlotBookingError> {
        if self.mounted {
            Ok(())
        } else {
            Err(SlotBookingError::NotMounted)
        }
    }

    async fn reload_selected_day(&mut self) -> Result<RefreshOutcome, SlotBookingError> {
        let date_key = self.calendar.selected_key();
        // The previous date's poll must not tick while the new date loads.
        self.poller.stop();
        let loaded = self.poller.refresh(&date_key, PollMode::Foreground).await;
        self.poller.start(&date_key);
        loaded
    }
}

impl Drop for SlotBookingView {
    fn drop(&mut self) {
        self.unmount();
    }
}
