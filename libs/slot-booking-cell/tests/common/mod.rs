#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Notify;

use shared_models::AppError;
use slot_booking_cell::models::{BookSlotRequest, DaySlots, TimeSlot};
use slot_booking_cell::services::date_key::{from_date_key, parse_slot_time};
use slot_booking_cell::services::gateway::SlotGateway;

#[derive(Debug, Clone)]
pub enum Step {
    Ok,
    Reject(&'static str),
    Offline,
}

impl Step {
    fn into_result(self) -> Result<(), AppError> {
        match self {
            Step::Ok => Ok(()),
            Step::Reject(message) => Err(AppError::rejected(Some(message.to_string()))),
            Step::Offline => Err(AppError::Transport("connection refused".to_string())),
        }
    }
}

/// Scriptable in-process stand-in for the slot backend.
pub struct FakeGateway {
    pub board: Mutex<Vec<DaySlots>>,
    pub queued: Mutex<VecDeque<(Duration, Vec<DaySlots>)>>,
    pub fail_fetch: AtomicBool,
    pub fetches: Mutex<Vec<String>>,
    pub book_step: Mutex<Step>,
    pub stamp_step: Mutex<Step>,
    pub booked: Mutex<Vec<BookSlotRequest>>,
    pub stamped: Mutex<Vec<(String, String, String)>>,
    pub hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeGateway {
    pub fn new(board: Vec<DaySlots>) -> Self {
        Self {
            board: Mutex::new(board),
            queued: Mutex::new(VecDeque::new()),
            fail_fetch: AtomicBool::new(false),
            fetches: Mutex::new(Vec::new()),
            book_step: Mutex::new(Step::Ok),
            stamp_step: Mutex::new(Step::Ok),
            booked: Mutex::new(Vec::new()),
            stamped: Mutex::new(Vec::new()),
            hold: None,
        }
    }

    /// Booking calls signal `entered` and then wait for `release`.
    pub fn holding(board: Vec<DaySlots>, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            hold: Some((entered, release)),
            ..Self::new(board)
        }
    }

    pub fn with_steps(self, book: Step, stamp: Step) -> Self {
        *self.book_step.lock().unwrap() = book;
        *self.stamp_step.lock().unwrap() = stamp;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetched_dates(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn set_board(&self, board: Vec<DaySlots>) {
        *self.board.lock().unwrap() = board;
    }

    pub fn queue(&self, delay: Duration, board: Vec<DaySlots>) {
        self.queued.lock().unwrap().push_back((delay, board));
    }
}

#[async_trait]
impl SlotGateway for FakeGateway {
    async fn available_slots(&self, date_key: &str, _weeks: u32) -> Result<Vec<DaySlots>, AppError> {
        self.fetches.lock().unwrap().push(date_key.to_string());

        let queued = self.queued.lock().unwrap().pop_front();
        if let Some((delay, _)) = &queued {
            tokio::time::sleep(*delay).await;
        }
        let days = match queued {
            Some((_, days)) => days,
            None => self.board.lock().unwrap().clone(),
        };

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Transport("connection reset".to_string()));
        }
        Ok(days)
    }

    async fn book_slot(&self, request: &BookSlotRequest) -> Result<(), AppError> {
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }

        let step = self.book_step.lock().unwrap().clone();
        step.into_result()?;
        self.booked.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn stamp_patient_schedule(&self, patient_id: &str, scan_date: &str, scan_time: &str) -> Result<(), AppError> {
        let step = self.stamp_step.lock().unwrap().clone();
        step.into_result()?;
        self.stamped
            .lock()
            .unwrap()
            .push((patient_id.to_string(), scan_date.to_string(), scan_time.to_string()));
        Ok(())
    }
}

pub fn day(date: &str, slots: &[(&str, bool)]) -> DaySlots {
    DaySlots {
        date: date.to_string(),
        slots: slots.iter().map(|(time, available)| TimeSlot::new(time, *available)).collect(),
    }
}

pub fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::new(from_date_key(date).unwrap(), parse_slot_time(time).unwrap())
}
