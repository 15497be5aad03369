// libs/slot-booking-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==============================================================================
// CALENDAR MODELS
// ==============================================================================

/// One selectable-or-not day in the month grid. Regenerated on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date_key: String,
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_past: bool,
    pub is_closed: bool,
}

impl CalendarDay {
    pub fn selectable(&self) -> bool {
        !self.is_past && !self.is_closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    /// Leading blank aligning day 1 under its weekday column.
    Padding { index: u32 },
    Day(CalendarDay),
}

impl GridCell {
    pub fn as_day(&self) -> Option<&CalendarDay> {
        match self {
            GridCell::Day(day) => Some(day),
            GridCell::Padding { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthJump {
    Rejected,
    Moved { selection_reset: bool },
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    /// `HH:mm`, 24-hour.
    pub time: String,
    pub available: bool,
    /// Set locally when the slot is today and its time is no longer in the future.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled_because_time_passed: bool,
}

impl TimeSlot {
    pub fn new(time: &str, available: bool) -> Self {
        Self {
            time: time.to_string(),
            available,
            disabled_because_time_passed: false,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.available && !self.disabled_because_time_passed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaySlots {
    pub date: String,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

impl DaySlots {
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            slots: Vec::new(),
        }
    }

    pub fn slot(&self, time: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.time == time)
    }

    pub fn selectable_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_selectable()).count()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsResponse {
    #[serde(default)]
    pub slots: Vec<DaySlots>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookSlotRequest {
    pub date: String,
    pub time: String,
    pub doctor_id: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ==============================================================================
// SELECTION & BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub date: String,
    pub time: String,
}

/// Which of the two booking steps took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingResult {
    pub slot_booked: bool,
    pub patient_updated: bool,
}

impl BookingResult {
    pub fn is_full_success(&self) -> bool {
        self.slot_booked && self.patient_updated
    }

    pub fn is_partial(&self) -> bool {
        self.slot_booked && !self.patient_updated
    }
}

/// Parameters handed over by the navigation layer when the booking screen opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEntry {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitNavigation {
    /// Replace (not push) the booking screen with the doctor's patient list.
    ReplaceWithPatientList { doctor_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// User initiated: loading indicator, errors surfaced.
    Foreground,
    /// Timer initiated: silent, failures keep the previous board.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { days: usize },
    /// An older request finished after a newer one was applied.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slots_response_parses_backend_shape() {
        let response: SlotsResponse = serde_json::from_value(json!({
            "success": true,
            "slots": [
                {"date": "2024-03-15", "slots": [
                    {"time": "09:00", "available": true},
                    {"time": "09:30", "available": false}
                ]},
                {"date": "2024-03-16"}
            ]
        }))
        .unwrap();

        assert_eq!(response.slots.len(), 2);
        assert_eq!(response.slots[0].selectable_count(), 1);
        assert!(response.slots[1].slots.is_empty());
        assert!(!response.slots[0].slots[0].disabled_because_time_passed);
    }

    #[test]
    fn test_time_passed_overrides_backend_availability() {
        let slot = TimeSlot {
            time: "14:00".to_string(),
            available: true,
            disabled_because_time_passed: true,
        };

        assert!(!slot.is_selectable());
    }

    #[test]
    fn test_booking_result_combinations() {
        let partial = BookingResult { slot_booked: true, patient_updated: false };
        assert!(partial.is_partial());
        assert!(!partial.is_full_success());

        let full = BookingResult { slot_booked: true, patient_updated: true };
        assert!(full.is_full_success());
    }
}
