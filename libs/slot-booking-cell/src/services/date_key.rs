//! Canonical day and time keys used on the wire: `YYYY-MM-DD` and `HH:mm`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SlotBookingError;

/// Formats with the local calendar; month and day are zero-padded.
pub fn to_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a strict `YYYY-MM-DD` key into a calendar date (local midnight).
pub fn from_date_key(key: &str) -> Result<NaiveDate, SlotBookingError> {
    let bytes = key.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shaped {
        return Err(SlotBookingError::InvalidDateKey(key.to_string()));
    }

    let field = |range: std::ops::Range<usize>| key[range].parse::<u32>();
    let (Ok(year), Ok(month), Ok(day)) = (field(0..4), field(5..7), field(8..10)) else {
        return Err(SlotBookingError::InvalidDateKey(key.to_string()));
    };

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| SlotBookingError::InvalidDateKey(key.to_string()))
}

/// Accepts `HH:mm` and the `HH:mm:ss` form some backend rows carry.
pub fn parse_slot_time(time: &str) -> Result<NaiveTime, SlotBookingError> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| SlotBookingError::InvalidTime(time.to_string()))
}

/// True when `date_key` is today and `time` is at or before the current minute.
/// Unparseable times on today are treated as passed.
pub fn time_has_passed(date_key: &str, time: &str, now: NaiveDateTime) -> bool {
    if date_key != to_date_key(now.date()) {
        return false;
    }
    match parse_slot_time(time) {
        Ok(slot_time) => slot_time <= now.time(),
        Err(_) => true,
    }
}
