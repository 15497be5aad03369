use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use patient_cell::models::UpdatePatientRequest;
use patient_cell::services::patient::PatientService;
use shared_gateway::BackendClient;
use shared_models::AppError;

use crate::models::{BackendAck, BookSlotRequest, DaySlots, SlotsResponse};

pub const SLOTS_ENDPOINT: &str = "slots.php";

/// The three backend calls the booking core depends on.
#[async_trait]
pub trait SlotGateway: Send + Sync {
    async fn available_slots(&self, date_key: &str, weeks: u32) -> Result<Vec<DaySlots>, AppError>;

    async fn book_slot(&self, request: &BookSlotRequest) -> Result<(), AppError>;

    async fn stamp_patient_schedule(
        &self,
        patient_id: &str,
        scan_date: &str,
        scan_time: &str,
    ) -> Result<(), AppError>;
}

pub struct BackendSlotGateway {
    client: Arc<BackendClient>,
    patients: PatientService,
}

impl BackendSlotGateway {
    pub fn new(client: Arc<BackendClient>) -> Self {
        let patients = PatientService::new(Arc::clone(&client));
        Self { client, patients }
    }
}

#[async_trait]
impl SlotGateway for BackendSlotGateway {
    async fn available_slots(&self, date_key: &str, weeks: u32) -> Result<Vec<DaySlots>, AppError> {
        debug!("Fetching slots from {} for {} week(s)", date_key, weeks);

        let weeks = weeks.to_string();
        let response: SlotsResponse = self
            .client
            .get(SLOTS_ENDPOINT, &[("date", date_key), ("weeks", weeks.as_str())])
            .await?;

        Ok(response.slots)
    }

    async fn book_slot(&self, request: &BookSlotRequest) -> Result<(), AppError> {
        let ack: BackendAck = self.client.post(SLOTS_ENDPOINT, request).await?;
        if let Some(message) = ack.message {
            debug!("Backend confirmed slot {} {}: {}", request.date, request.time, message);
        }
        Ok(())
    }

    async fn stamp_patient_schedule(
        &self,
        patient_id: &str,
        scan_date: &str,
        scan_time: &str,
    ) -> Result<(), AppError> {
        self.patients
            .update(UpdatePatientRequest::schedule(patient_id, scan_date, scan_time))
            .await
    }
}
