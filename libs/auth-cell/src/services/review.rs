use std::sync::Arc;

use tracing::{debug, info};

use shared_gateway::BackendClient;
use shared_models::{AppError, UserType};

use crate::models::{AuthAck, AuthAction, DoctorActionRequest, PendingDoctor, PendingDoctorsResponse, AUTH_ENDPOINT};

/// Lab-side approval queue for doctor registrations. Only A1 users may use it.
pub struct DoctorReviewService {
    client: Arc<BackendClient>,
}

impl DoctorReviewService {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }

    pub async fn pending_doctors(&self) -> Result<Vec<PendingDoctor>, AppError> {
        self.client.session().require_role(UserType::A1User)?;

        let response: PendingDoctorsResponse = self
            .client
            .post(
                AUTH_ENDPOINT,
                &DoctorActionRequest {
                    action: AuthAction::GetPendingDoctors,
                    doctor_id: None,
                },
            )
            .await?;

        debug!("{} doctor(s) awaiting approval", response.doctors.len());
        Ok(response.doctors)
    }

    pub async fn approve(&self, doctor_id: &str) -> Result<(), AppError> {
        self.decide(AuthAction::ApproveDoctor, doctor_id).await?;
        info!("Approved doctor {}", doctor_id);
        Ok(())
    }

    pub async fn decline(&self, doctor_id: &str) -> Result<(), AppError> {
        self.decide(AuthAction::DeclineDoctor, doctor_id).await?;
        info!("Declined doctor {}", doctor_id);
        Ok(())
    }

    async fn decide(&self, action: AuthAction, doctor_id: &str) -> Result<(), AppError> {
        self.client.session().require_role(UserType::A1User)?;

        let _: AuthAck = self
            .client
            .post(
                AUTH_ENDPOINT,
                &DoctorActionRequest {
                    action,
                    doctor_id: Some(doctor_id),
                },
            )
            .await?;
        Ok(())
    }
}
