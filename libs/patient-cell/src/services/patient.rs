use std::sync::Arc;

use tracing::{debug, error};

use shared_gateway::BackendClient;
use shared_models::{AppError, UserType};
use shared_utils::validation::FieldValidator;

use crate::models::{
    CreatePatientRequest, CreatePatientResponse, Patient, PatientAck, PatientDetailsResponse, PatientListResponse,
    PatientStatus, UpdatePatientRequest,
};

pub const PATIENTS_ENDPOINT: &str = "patients.php";

pub struct PatientService {
    client: Arc<BackendClient>,
    validator: FieldValidator,
}

impl PatientService {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self {
            client,
            validator: FieldValidator::new(),
        }
    }

    pub async fn list_for_doctor(&self, doctor_id: &str) -> Result<Vec<Patient>, AppError> {
        debug!("Fetching patients for doctor: {}", doctor_id);

        let response: PatientListResponse = self
            .client
            .get(
                PATIENTS_ENDPOINT,
                &[("doctor_id", doctor_id), ("user_type", UserType::Doctor.as_str())],
            )
            .await?;

        Ok(response.patients)
    }

    /// Lab worklist: everything past intake, earliest scan first.
    /// Patients without a parseable schedule go to the end.
    pub async fn list_for_a1(&self) -> Result<Vec<Patient>, AppError> {
        debug!("Fetching lab worklist");

        let response: PatientListResponse = self
            .client
            .get(PATIENTS_ENDPOINT, &[("user_type", UserType::A1User.as_str())])
            .await?;

        Ok(lab_worklist(response.patients))
    }

    pub async fn details(&self, patient_id: &str) -> Result<Patient, AppError> {
        debug!("Fetching patient details: {}", patient_id);

        let response: PatientDetailsResponse = self
            .client
            .get(PATIENTS_ENDPOINT, &[("patient_id", patient_id)])
            .await?;

        Ok(response.patient)
    }

    pub async fn create(&self, request: CreatePatientRequest) -> Result<Option<String>, AppError> {
        let new_patient = request.validate(&self.validator)?;
        debug!("Creating patient {} for doctor {}", new_patient.name, new_patient.doctor_id);

        let response: CreatePatientResponse = self.client.post(PATIENTS_ENDPOINT, &new_patient).await?;

        if let Some(message) = &response.message {
            debug!("Patient created: {}", message);
        }
        Ok(response.patient_id)
    }

    pub async fn update(&self, request: UpdatePatientRequest) -> Result<(), AppError> {
        request.validate(&self.validator)?;
        debug!("Updating patient: {}", request.patient_id);

        let _: PatientAck = self.client.put(PATIENTS_ENDPOINT, &request).await.map_err(|e| {
            error!("Update patient {} failed: {}", request.patient_id, e);
            e
        })?;

        Ok(())
    }
}

pub fn lab_worklist(patients: Vec<Patient>) -> Vec<Patient> {
    let mut worklist: Vec<Patient> = patients
        .into_iter()
        .filter(|patient| patient.status != PatientStatus::Pending)
        .collect();

    worklist.sort_by_key(|patient| {
        let scheduled = patient.scheduled_at();
        (scheduled.is_none(), scheduled)
    });
    worklist
}
