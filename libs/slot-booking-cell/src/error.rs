use thiserror::Error;

use shared_models::AppError;

pub const LOAD_SLOTS_FAILED: &str = "Failed to load available slots";
pub const BOOKING_FAILED: &str = "Failed to book slot";
pub const PATIENT_UPDATE_FAILED: &str = "Failed to update patient details";

#[derive(Error, Debug)]
pub enum SlotBookingError {
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),

    #[error("Invalid slot time: {0}")]
    InvalidTime(String),

    #[error("Selected time slot is not available: {date} {time}")]
    SlotUnavailable { date: String, time: String },

    #[error("Please select a time slot")]
    NoSelection,

    #[error("A booking is already in progress")]
    BookingInProgress,

    #[error("Booking view is not mounted")]
    NotMounted,

    #[error(transparent)]
    Gateway(#[from] AppError),
}

impl SlotBookingError {
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SlotBookingError::Gateway(err) => err.user_message(fallback),
            SlotBookingError::SlotUnavailable { .. } => "Selected time slot is not available.".to_string(),
            other => other.to_string(),
        }
    }
}
