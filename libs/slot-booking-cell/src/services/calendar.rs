// libs/slot-booking-cell/src/services/calendar.rs
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, Weekday};
use tracing::debug;

use crate::error::SlotBookingError;
use crate::models::{CalendarDay, GridCell, MonthJump};
use crate::services::date_key::{from_date_key, to_date_key};

pub const DEFAULT_CLOSED_WEEKDAY: Weekday = Weekday::Sun;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Maps the 0 = Sunday .. 6 = Saturday convention used in configuration.
pub fn weekday_from_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// The month shown in the grid, always anchored on its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisibleMonth {
    first: NaiveDate,
}

impl VisibleMonth {
    /// `month0` is zero-based (0 = January).
    pub fn new(year: i32, month0: u32) -> Option<Self> {
        if month0 > 11 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month0 + 1, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month0(&self) -> u32 {
        self.first.month0()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        (28..=31)
            .rev()
            .find(|day| NaiveDate::from_ymd_opt(self.year(), self.first.month(), *day).is_some())
            .unwrap_or(28)
    }

    pub fn next(&self) -> Option<Self> {
        self.first.checked_add_months(Months::new(1)).map(|first| Self { first })
    }

    pub fn previous(&self) -> Option<Self> {
        self.first.checked_sub_months(Months::new(1)).map(|first| Self { first })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month0() == self.month0()
    }

    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0() as usize], self.year())
    }
}

impl fmt::Display for VisibleMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month0() + 1)
    }
}

impl FromStr for VisibleMonth {
    type Err = SlotBookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_date_key(&format!("{}-01", s.trim())).map(Self::containing)
    }
}

/// Lazily produced month grid. Cloning restarts it from the first cell.
#[derive(Debug, Clone)]
pub struct GridCells {
    month: VisibleMonth,
    today: NaiveDate,
    closed_weekday: Weekday,
    padding: u32,
    days: u32,
    position: u32,
}

pub fn build_grid(month: VisibleMonth, today: NaiveDate, closed_weekday: Weekday) -> GridCells {
    GridCells {
        month,
        today,
        closed_weekday,
        padding: month.first_day().weekday().num_days_from_sunday(),
        days: month.days_in_month(),
        position: 0,
    }
}

impl GridCells {
    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn days(&self) -> impl Iterator<Item = CalendarDay> {
        self.clone().filter_map(|cell| match cell {
            GridCell::Day(day) => Some(day),
            GridCell::Padding { .. } => None,
        })
    }

    fn day_cell(&self, day_of_month: u32) -> Option<CalendarDay> {
        let date = self.month.first_day().with_day(day_of_month)?;
        Some(CalendarDay {
            date_key: to_date_key(date),
            date,
            day_of_month,
            is_past: date < self.today,
            is_closed: date.weekday() == self.closed_weekday,
        })
    }
}

impl Iterator for GridCells {
    type Item = GridCell;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.position;
        if position >= self.padding + self.days {
            return None;
        }
        self.position += 1;

        if position < self.padding {
            return Some(GridCell::Padding { index: position });
        }
        self.day_cell(position - self.padding + 1).map(GridCell::Day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.padding + self.days).saturating_sub(self.position) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridCells {}

/// Visible month plus the highlighted day. `today` is passed in on each
/// call so one render pass uses one consistent value.
#[derive(Debug, Clone)]
pub struct CalendarState {
    visible: VisibleMonth,
    selected_date: NaiveDate,
    closed_weekday: Weekday,
}

impl CalendarState {
    pub fn new(today: NaiveDate, closed_weekday: Weekday) -> Self {
        Self {
            visible: VisibleMonth::containing(today),
            selected_date: today,
            closed_weekday,
        }
    }

    pub fn visible_month(&self) -> VisibleMonth {
        self.visible
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn selected_key(&self) -> String {
        to_date_key(self.selected_date)
    }

    pub fn closed_weekday(&self) -> Weekday {
        self.closed_weekday
    }

    pub fn cells(&self, today: NaiveDate) -> GridCells {
        build_grid(self.visible, today, self.closed_weekday)
    }

    pub fn is_selectable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today && date.weekday() != self.closed_weekday
    }

    /// Never moves before the current month. Returns whether the anchor moved.
    pub fn previous_month(&mut self, today: NaiveDate) -> bool {
        if self.visible <= VisibleMonth::containing(today) {
            debug!("Ignoring previous-month navigation from {}", self.visible);
            return false;
        }
        match self.visible.previous() {
            Some(previous) => {
                self.visible = previous;
                true
            }
            None => false,
        }
    }

    pub fn next_month(&mut self) -> bool {
        match self.visible.next() {
            Some(next) => {
                self.visible = next;
                true
            }
            None => false,
        }
    }

    /// Direct month/year jump. If the highlighted day falls outside the new
    /// month it moves to day 1 and the caller must drop the slot selection.
    pub fn jump_to(&mut self, year: i32, month0: u32, today: NaiveDate) -> MonthJump {
        let Some(target) = VisibleMonth::new(year, month0) else {
            return MonthJump::Rejected;
        };
        if target < VisibleMonth::containing(today) {
            debug!("Rejecting jump to past month {}", target);
            return MonthJump::Rejected;
        }

        self.visible = target;
        if target.contains(self.selected_date) {
            return MonthJump::Moved { selection_reset: false };
        }

        self.selected_date = target.first_day();
        MonthJump::Moved { selection_reset: true }
    }

    /// Highlights a day. Past and closed days are ignored (`Ok(false)`).
    /// The visible month follows the chosen day.
    pub fn select_date(&mut self, date_key: &str, today: NaiveDate) -> Result<bool, SlotBookingError> {
        let date = from_date_key(date_key)?;
        if !self.is_selectable(date, today) {
            debug!("Ignoring selection of disabled day {}", date_key);
            return Ok(false);
        }

        self.selected_date = date;
        self.visible = VisibleMonth::containing(date);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_padding_matches_weekday_of_first() {
        // 1 March 2024 is a Friday.
        let grid = build_grid(VisibleMonth::new(2024, 2).unwrap(), date(2024, 3, 15), Weekday::Sun);
        assert_eq!(grid.padding(), 5);
        assert_eq!(grid.len(), 5 + 31);

        // 1 September 2024 is a Sunday.
        let grid = build_grid(VisibleMonth::new(2024, 8).unwrap(), date(2024, 3, 15), Weekday::Sun);
        assert_eq!(grid.padding(), 0);
    }

    #[test]
    fn test_grid_is_restartable() {
        let grid = build_grid(VisibleMonth::new(2024, 1).unwrap(), date(2024, 2, 1), Weekday::Sun);
        let first: Vec<GridCell> = grid.clone().collect();
        let second: Vec<GridCell> = grid.collect();
        assert_eq!(first, second);
        assert_eq!(first.iter().filter_map(GridCell::as_day).count(), 29);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(VisibleMonth::new(2023, 1).unwrap().days_in_month(), 28);
        assert_eq!(VisibleMonth::new(2024, 1).unwrap().days_in_month(), 29);
        assert_eq!(VisibleMonth::new(2024, 3).unwrap().days_in_month(), 30);
        assert_eq!(VisibleMonth::new(2024, 11).unwrap().days_in_month(), 31);
    }

    #[test]
    fn test_month_parsing_and_label() {
        let month: VisibleMonth = "2024-03".parse().unwrap();
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(month.label(), "March 2024");
        assert!("2024-13".parse::<VisibleMonth>().is_err());
        assert!(VisibleMonth::new(2024, 12).is_none());
    }

    #[test]
    fn test_year_boundaries() {
        let december = VisibleMonth::new(2024, 11).unwrap();
        assert_eq!(december.next().unwrap(), VisibleMonth::new(2025, 0).unwrap());
        assert_eq!(VisibleMonth::new(2025, 0).unwrap().previous().unwrap(), december);
    }

    #[test]
    fn test_weekday_index_mapping() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_index(7), None);
    }

    #[test]
    fn test_select_date_ignores_disabled_days() {
        let today = date(2024, 3, 15);
        let mut calendar = CalendarState::new(today, Weekday::Sun);

        assert!(!calendar.select_date("2024-03-14", today).unwrap());
        assert!(!calendar.select_date("2024-03-17", today).unwrap());
        assert_eq!(calendar.selected_key(), "2024-03-15");

        assert!(calendar.select_date("2024-04-02", today).unwrap());
        assert_eq!(calendar.selected_key(), "2024-04-02");
        assert_eq!(calendar.visible_month(), VisibleMonth::new(2024, 3).unwrap());

        assert!(calendar.select_date("2024-4-2", today).is_err());
    }

    #[test]
    fn test_jump_keeps_selection_inside_target_month() {
        let today = date(2024, 3, 15);
        let mut calendar = CalendarState::new(today, Weekday::Sun);
        calendar.select_date("2024-05-20", today).unwrap();
        calendar.previous_month(today);

        assert_eq!(calendar.jump_to(2024, 4, today), MonthJump::Moved { selection_reset: false });
        assert_eq!(calendar.selected_key(), "2024-05-20");

        assert_eq!(calendar.jump_to(2025, 0, today), MonthJump::Moved { selection_reset: true });
        assert_eq!(calendar.selected_key(), "2025-01-01");
    }

    #[test]
    fn test_jump_rejects_past_months() {
        let today = date(2024, 3, 15);
        let mut calendar = CalendarState::new(today, Weekday::Sun);
        calendar.next_month();

        assert_eq!(calendar.jump_to(2024, 1, today), MonthJump::Rejected);
        assert_eq!(calendar.jump_to(2023, 11, today), MonthJump::Rejected);
        assert_eq!(calendar.jump_to(2024, 12, today), MonthJump::Rejected);
        assert_eq!(calendar.visible_month(), VisibleMonth::new(2024, 3).unwrap());

        assert_eq!(calendar.jump_to(2024, 2, today), MonthJump::Moved { selection_reset: false });
    }
}
