use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::SlotBookingError;
use crate::models::{DaySlots, Selection};
use crate::services::date_key::time_has_passed;

/// The single (date, time) pair the user intends to book.
#[derive(Debug, Default, Clone)]
pub struct SlotSelection {
    current: Option<Selection>,
}

impl SlotSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous choice. Only slots that are effectively
    /// available at `now` can be chosen.
    pub fn select(&mut self, day: &DaySlots, time: &str, now: NaiveDateTime) -> Result<&Selection, SlotBookingError> {
        let selectable = day
            .slot(time)
            .is_some_and(|slot| slot.is_selectable() && !time_has_passed(&day.date, &slot.time, now));

        if !selectable {
            debug!("Rejected selection of unavailable slot {} {}", day.date, time);
            return Err(SlotBookingError::SlotUnavailable {
                date: day.date.clone(),
                time: time.to_string(),
            });
        }

        Ok(self.current.insert(Selection {
            date: day.date.clone(),
            time: time.to_string(),
        }))
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    pub fn is_selected(&self, date: &str, time: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|selection| selection.date == date && selection.time == time)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
