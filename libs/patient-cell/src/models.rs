use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use shared_models::ids::{flexible_id, optional_flexible_id};
use shared_models::AppError;
use shared_utils::validation::{digits_only, FieldValidator, ValidationReport};

pub const MAX_PHOTOS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    /// Intake submitted, no slot yet.
    Pending,
    /// A scan slot has been booked.
    Scanned,
    /// Scan done and files delivered.
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Pending => "pending",
            PatientStatus::Scanned => "scanned",
            PatientStatus::Completed => "completed",
            PatientStatus::Cancelled => "cancelled",
            PatientStatus::Unknown => "unknown",
        }
    }

    /// Label shown on dashboards. The backend's status names lag one step
    /// behind what the clinic calls them.
    pub fn label(&self) -> &'static str {
        match self {
            PatientStatus::Pending => "Pending",
            PatientStatus::Scanned => "Slot Booked",
            PatientStatus::Completed => "Scanned",
            PatientStatus::Cancelled => "Cancelled",
            PatientStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PatientStatus::Pending),
            "scanned" | "slot-booked" | "slot_booked" => Ok(PatientStatus::Scanned),
            "completed" => Ok(PatientStatus::Completed),
            "cancelled" => Ok(PatientStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown patient status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(AppError::Validation(format!("Unknown gender: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_flexible_id")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "optional_age")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub scan_date: Option<String>,
    #[serde(default)]
    pub scan_time: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub photo_path1: Option<String>,
    #[serde(default)]
    pub photo_path2: Option<String>,
    #[serde(default)]
    pub photo_path3: Option<String>,
    #[serde(default)]
    pub photo_path4: Option<String>,
    #[serde(default)]
    pub photo_path5: Option<String>,
    #[serde(default)]
    pub photo_path6: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Patient {
    /// Stored photo paths in slot order, blanks skipped.
    pub fn photos(&self) -> Vec<&str> {
        [
            &self.photo_path1,
            &self.photo_path2,
            &self.photo_path3,
            &self.photo_path4,
            &self.photo_path5,
            &self.photo_path6,
        ]
        .into_iter()
        .filter_map(|path| path.as_deref())
        .filter(|path| !path.trim().is_empty())
        .collect()
    }

    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.scan_date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        let raw_time = self.scan_time.as_deref()?.trim();
        let time = NaiveTime::parse_from_str(raw_time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw_time, "%H:%M"))
            .ok()?;
        Some(NaiveDateTime::new(date, time))
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at().is_some()
    }
}

fn optional_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientListResponse {
    #[serde(default)]
    pub patients: Vec<Patient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientDetailsResponse {
    pub patient: Patient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientResponse {
    #[serde(default, deserialize_with = "optional_flexible_id")]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// Intake form as typed by the doctor. Nothing here is trusted until
/// [`CreatePatientRequest::validate`] turns it into a [`NewPatient`].
#[derive(Debug, Clone, Default)]
pub struct CreatePatientRequest {
    pub doctor_id: String,
    pub name: String,
    pub contact_number: String,
    pub location: String,
    pub age: Option<String>,
    pub gender: Gender,
    pub chief_complaint: String,
    pub medical_history: String,
}

/// Wire body for `POST patients.php`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewPatient {
    pub doctor_id: String,
    pub name: String,
    pub contact_number: String,
    pub location: String,
    pub age: Option<u32>,
    pub gender: Gender,
    pub chief_complaint: String,
    pub medical_history: String,
}

impl CreatePatientRequest {
    pub fn validate(&self, validator: &FieldValidator) -> Result<NewPatient, AppError> {
        let mut report = ValidationReport::default();

        let name = self.name.trim();
        if name.is_empty() {
            report.push("name", "Patient name is required");
        } else if !validator.validate_patient_name(name) {
            report.push("name", "Only letters and dots, at least 3 characters");
        }

        let contact = digits_only(&self.contact_number);
        if contact.is_empty() {
            report.push("contact_number", "Contact number is required");
        } else if !validator.validate_patient_contact(&contact) {
            report.push("contact_number", "Enter a valid mobile number");
        }

        let location = self.location.trim();
        if location.is_empty() {
            report.push("location", "Location is required");
        } else if !validator.validate_location(location) {
            report.push("location", "Letters, digits, dot, comma, #, at least 3 characters");
        }

        let age = match self.age.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(age) => match validator.validate_age(age) {
                    Ok(()) => Some(age),
                    Err(message) => {
                        report.push("age", message);
                        None
                    }
                },
                Err(_) => {
                    report.push("age", "Enter a valid positive age");
                    None
                }
            },
        };

        report.into_result()?;

        Ok(NewPatient {
            doctor_id: self.doctor_id.clone(),
            name: name.to_string(),
            contact_number: contact,
            location: location.to_string(),
            age,
            gender: self.gender,
            chief_complaint: self.chief_complaint.trim().to_string(),
            medical_history: self.medical_history.trim().to_string(),
        })
    }
}

/// Partial update; only the fields that are set go over the wire.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdatePatientRequest {
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_time: Option<String>,
}

impl UpdatePatientRequest {
    pub fn schedule(patient_id: &str, scan_date: &str, scan_time: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            scan_date: Some(scan_date.to_string()),
            scan_time: Some(scan_time.to_string()),
            ..Default::default()
        }
    }

    pub fn contact_details(patient_id: &str, contact_number: &str, age: u32) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            contact_number: Some(digits_only(contact_number)),
            age: Some(age),
            ..Default::default()
        }
    }

    pub fn validate(&self, validator: &FieldValidator) -> Result<(), AppError> {
        let mut report = ValidationReport::default();

        if self.patient_id.trim().is_empty() {
            report.push("patient_id", "Patient id is required");
        }
        if let Some(contact) = &self.contact_number {
            if !validator.validate_patient_contact(contact) {
                report.push("contact_number", "Enter a valid mobile number");
            }
        }
        if let Some(age) = self.age {
            if let Err(message) = validator.validate_age(age) {
                report.push("age", message);
            }
        }

        report.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub slot_booked: usize,
    pub scanned: usize,
    pub cancelled: usize,
}

impl DashboardStats {
    pub fn from_patients(patients: &[Patient]) -> Self {
        patients.iter().fold(
            Self {
                total: patients.len(),
                ..Default::default()
            },
            |mut stats, patient| {
                match patient.status {
                    PatientStatus::Pending => stats.pending += 1,
                    PatientStatus::Scanned => stats.slot_booked += 1,
                    PatientStatus::Completed => stats.scanned += 1,
                    PatientStatus::Cancelled => stats.cancelled += 1,
                    PatientStatus::Unknown => {}
                }
                stats
            },
        )
    }
}

/// `None` keeps every patient.
pub fn filter_by_status(patients: &[Patient], status: Option<PatientStatus>) -> Vec<&Patient> {
    patients
        .iter()
        .filter(|patient| status.map_or(true, |wanted| patient.status == wanted))
        .collect()
}

// ==============================================================================
// UPLOADS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Report,
    Image,
}

impl UploadKind {
    pub fn max_bytes(&self) -> u64 {
        match self {
            UploadKind::Video => 100 * 1024 * 1024,
            UploadKind::Report => 10 * 1024 * 1024,
            UploadKind::Image => 5 * 1024 * 1024,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Video => &["mp4", "avi", "mov", "webm", "mkv"],
            UploadKind::Report => &["pdf", "doc", "docx"],
            UploadKind::Image => &["jpg", "jpeg", "png", "gif", "bmp"],
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Report => "report",
            UploadKind::Image => "photos[]",
        }
    }

    pub fn mime_for(&self, extension: &str) -> &'static str {
        match extension {
            "mp4" => "video/mp4",
            "avi" => "video/x-msvideo",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uploader {
    /// Lab side: scan video and report.
    A1,
    /// Referring doctor: intra-oral photos.
    Doctor,
}

impl Uploader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Uploader::A1 => "a1",
            Uploader::Doctor => "doctor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub kind: UploadKind,
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(kind: UploadKind, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            data,
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_for(self.extension().as_deref().unwrap_or_default())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let allowed = self.kind.allowed_extensions();
        match self.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "{} must be one of: {}",
                    self.file_name,
                    allowed.join(", ")
                )))
            }
        }

        if self.size() > self.kind.max_bytes() {
            return Err(AppError::Validation(format!(
                "{} exceeds the {} MB limit",
                self.file_name,
                self.kind.max_bytes() / (1024 * 1024)
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UploadBundle {
    pub uploader: Uploader,
    pub video: Option<UploadFile>,
    pub report: Option<UploadFile>,
    pub photos: Vec<UploadFile>,
}

impl UploadBundle {
    pub fn lab(video: Option<UploadFile>, report: Option<UploadFile>) -> Self {
        Self {
            uploader: Uploader::A1,
            video,
            report,
            photos: Vec::new(),
        }
    }

    pub fn doctor_photos(photos: Vec<UploadFile>) -> Self {
        Self {
            uploader: Uploader::Doctor,
            video: None,
            report: None,
            photos,
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &UploadFile> {
        self.video.iter().chain(self.report.iter()).chain(self.photos.iter())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self.uploader {
            Uploader::A1 if self.video.is_none() && self.report.is_none() => {
                return Err(AppError::Validation(
                    "Please select at least a video or a report to upload".to_string(),
                ));
            }
            Uploader::A1 if !self.photos.is_empty() => {
                return Err(AppError::Validation("Photos are uploaded by the referring doctor".to_string()));
            }
            Uploader::Doctor if self.photos.is_empty() => {
                return Err(AppError::Validation("Please select at least one photo to upload".to_string()));
            }
            _ => {}
        }

        if self.photos.len() > MAX_PHOTOS {
            return Err(AppError::Validation(format!("At most {} photos can be uploaded", MAX_PHOTOS)));
        }

        self.files().try_for_each(UploadFile::validate)
    }
}
