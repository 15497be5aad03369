// =====================================================================================
// FIELD VALIDATION - LOGIN, REGISTRATION AND PATIENT INTAKE FORMS
// =====================================================================================

use regex::Regex;
use tracing::debug;

use shared_models::AppError;

const PASSWORD_SPECIALS: &str = "@$!%*?&";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collects per-field issues so a form can report all of them at once.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(FieldIssue::new(field, message));
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_valid() {
            return Ok(());
        }
        debug!("Form rejected with {} issue(s)", self.issues.len());
        let summary = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation(summary))
    }
}

pub struct FieldValidator {
    email: Regex,
    doctor_phone: Regex,
    patient_name: Regex,
    patient_contact: Regex,
    location: Regex,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"),
            doctor_phone: Regex::new(r"^\d{10}$").expect("phone pattern"),
            patient_name: Regex::new(r"^[A-Za-z\s.]{3,}$").expect("name pattern"),
            patient_contact: Regex::new(r"^[6-9]\d{9}$").expect("contact pattern"),
            location: Regex::new(r"^[A-Za-z\s.,#0-9]{3,}$").expect("location pattern"),
        }
    }

    pub fn validate_email(&self, email: &str) -> bool {
        self.email.is_match(email)
    }

    pub fn validate_doctor_phone(&self, phone: &str) -> bool {
        self.doctor_phone.is_match(phone)
    }

    /// At least 8 characters with a lowercase letter, a digit and one of `@$!%*?&`.
    pub fn validate_password(&self, password: &str) -> bool {
        password.chars().count() >= 8
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
    }

    pub fn validate_patient_name(&self, name: &str) -> bool {
        self.patient_name.is_match(name)
    }

    /// Mobile numbers: ten digits starting with 6-9, after stripping non-digits.
    pub fn validate_patient_contact(&self, contact: &str) -> bool {
        self.patient_contact.is_match(&digits_only(contact))
    }

    pub fn validate_location(&self, location: &str) -> bool {
        self.location.is_match(location)
    }

    pub fn validate_age(&self, age: u32) -> Result<(), &'static str> {
        match age {
            0 => Err("Enter a valid positive age"),
            a if a >= 100 => Err("Age must be below 100"),
            _ => Ok(()),
        }
    }
}

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
