use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_gateway::{BackendClient, Session};
use shared_models::{AppError, AuthState, User, UserType};
use shared_utils::validation::{FieldValidator, ValidationReport};

use crate::models::{
    AuthAck, AuthAction, LoginRequest, LoginResponse, RegisterBody, RegisterDoctorRequest, ResetPasswordRequest,
    AUTH_ENDPOINT,
};

const PASSWORD_RULE: &str = "At least 8 characters with a lowercase letter, a number and a special character";

pub struct AuthService {
    client: Arc<BackendClient>,
    validator: FieldValidator,
}

impl AuthService {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self {
            client,
            validator: FieldValidator::new(),
        }
    }

    fn session(&self) -> &Session {
        self.client.session()
    }

    fn check_email(&self, report: &mut ValidationReport, email: &str) {
        if email.is_empty() {
            report.push("email", "Email is required");
        } else if !self.validator.validate_email(email) {
            report.push("email", "Enter a valid email address");
        }
    }

    fn check_password(&self, report: &mut ValidationReport, field: &'static str, password: &str) {
        if password.is_empty() {
            report.push(field, "Password is required");
        } else if !self.validator.validate_password(password) {
            report.push(field, PASSWORD_RULE);
        }
    }

    /// Logs in and establishes the session. The role reported by the backend
    /// wins over the one requested when both are present.
    pub async fn login(&self, user_type: UserType, email: &str, password: &str) -> Result<AuthState, AppError> {
        let email = email.trim();

        let mut report = ValidationReport::default();
        self.check_email(&mut report, email);
        if password.is_empty() {
            report.push("password", "Password is required");
        }
        report.into_result()?;

        debug!("Logging in {} as {}", email, user_type);

        let response: LoginResponse = self
            .client
            .post(
                AUTH_ENDPOINT,
                &LoginRequest {
                    action: AuthAction::login_for(user_type),
                    email,
                    password,
                },
            )
            .await?;

        let auth = AuthState {
            token: response.token,
            user: response.user,
            user_type: response.user_type.unwrap_or(user_type),
        };
        if auth.user_type != user_type {
            warn!("Backend returned role {} for a {} login", auth.user_type, user_type);
        }

        self.session().establish(auth.clone())?;
        info!("User {} logged in as {}", auth.user.id, auth.user_type);
        Ok(auth)
    }

    pub async fn register_doctor(&self, request: RegisterDoctorRequest) -> Result<Option<String>, AppError> {
        let request = RegisterDoctorRequest {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            specialization: request.specialization.trim().to_string(),
            ..request
        };

        let mut report = ValidationReport::default();
        if request.name.is_empty() {
            report.push("name", "Name is required");
        }
        self.check_email(&mut report, &request.email);
        if request.phone.is_empty() {
            report.push("phone", "Phone number is required");
        } else if !self.validator.validate_doctor_phone(&request.phone) {
            report.push("phone", "Phone must be 10 digits");
        }
        self.check_password(&mut report, "password", &request.password);
        report.into_result()?;

        debug!("Registering doctor {}", request.email);

        let ack: AuthAck = self
            .client
            .post(
                AUTH_ENDPOINT,
                &RegisterBody {
                    action: AuthAction::DoctorRegister,
                    doctor: &request,
                },
            )
            .await?;

        info!("Doctor registration submitted for {}", request.email);
        Ok(ack.message)
    }

    pub async fn reset_password(&self, user_type: UserType, email: &str, new_password: &str) -> Result<(), AppError> {
        let email = email.trim();

        let mut report = ValidationReport::default();
        self.check_email(&mut report, email);
        self.check_password(&mut report, "new_password", new_password);
        report.into_result()?;

        let _: AuthAck = self
            .client
            .post(
                AUTH_ENDPOINT,
                &ResetPasswordRequest {
                    action: AuthAction::reset_for(user_type),
                    email,
                    new_password,
                },
            )
            .await?;

        info!("Password reset for {} ({})", email, user_type);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AppError> {
        if let Some(user) = self.current_user() {
            info!("Logging out user {}", user.id);
        }
        self.session().clear()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session().current().map(|auth| auth.user)
    }
}
