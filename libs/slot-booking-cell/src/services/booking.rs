use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use shared_models::AppError;

use crate::error::{SlotBookingError, BOOKING_FAILED};
use crate::models::{BookSlotRequest, BookingResult, ExitNavigation, Selection};
use crate::services::gateway::SlotGateway;

pub const BOOKED_MESSAGE: &str = "Appointment booked successfully!";
pub const BOOKED_NOT_LINKED_MESSAGE: &str =
    "Slot booked but failed to update patient details. Redirecting to dashboard anyway.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Rejected,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl BookingFailure {
    fn from_gateway(err: &AppError) -> Self {
        let kind = match err {
            AppError::Transport(_) => FailureKind::Transport,
            AppError::Rejected { .. } => FailureKind::Rejected,
            _ => FailureKind::Malformed,
        };

        Self {
            kind,
            message: err.user_message(BOOKING_FAILED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked,
    /// Reservation went through but the patient record was not stamped.
    BookedNotLinked { reason: String },
    Failed(BookingFailure),
}

impl BookingOutcome {
    pub fn result(&self) -> BookingResult {
        match self {
            BookingOutcome::Booked => BookingResult { slot_booked: true, patient_updated: true },
            BookingOutcome::BookedNotLinked { .. } => BookingResult { slot_booked: true, patient_updated: false },
            BookingOutcome::Failed(_) => BookingResult { slot_booked: false, patient_updated: false },
        }
    }

    pub fn exit_navigation(&self, doctor_id: &str) -> Option<ExitNavigation> {
        match self {
            BookingOutcome::Failed(_) => None,
            _ => Some(ExitNavigation::ReplaceWithPatientList {
                doctor_id: doctor_id.to_string(),
            }),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BookingOutcome::Booked => "Success",
            BookingOutcome::BookedNotLinked { .. } => "Partial Success",
            BookingOutcome::Failed(_) => "Error",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            BookingOutcome::Booked => BOOKED_MESSAGE.to_string(),
            BookingOutcome::BookedNotLinked { .. } => BOOKED_NOT_LINKED_MESSAGE.to_string(),
            BookingOutcome::Failed(failure) => failure.message.clone(),
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Two-step commit: reserve the slot, then stamp the schedule onto the patient.
///
/// The steps are not atomic and a failed second step is never rolled back.
/// Only one transaction runs at a time per instance.
pub struct BookingTransaction {
    gateway: Arc<dyn SlotGateway>,
    in_flight: AtomicBool,
}

impl BookingTransaction {
    pub fn new(gateway: Arc<dyn SlotGateway>) -> Self {
        Self {
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn book_slot(
        &self,
        selection: &Selection,
        patient_id: &str,
        doctor_id: &str,
    ) -> Result<BookingOutcome, SlotBookingError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Ignoring booking of {} {} while another is pending", selection.date, selection.time);
            return Err(SlotBookingError::BookingInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        let request = BookSlotRequest {
            date: selection.date.clone(),
            time: selection.time.clone(),
            doctor_id: doctor_id.to_string(),
            patient_id: patient_id.to_string(),
        };

        if let Err(err) = self.gateway.book_slot(&request).await {
            error!("Book slot error for patient {}: {}", patient_id, err);
            return Ok(BookingOutcome::Failed(BookingFailure::from_gateway(&err)));
        }

        info!("Reserved {} {} for patient {}", selection.date, selection.time, patient_id);

        match self
            .gateway
            .stamp_patient_schedule(patient_id, &selection.date, &selection.time)
            .await
        {
            Ok(()) => Ok(BookingOutcome::Booked),
            Err(err) => {
                warn!(
                    "Slot {} {} reserved but patient {} was not updated: {}",
                    selection.date, selection.time, patient_id, err
                );
                Ok(BookingOutcome::BookedNotLinked {
                    reason: err.user_message(crate::error::PATIENT_UPDATE_FAILED),
                })
            }
        }
    }
}
