use serde::{Deserialize, Serialize};

use shared_models::ids::flexible_id;
use shared_models::{User, UserType};

pub const AUTH_ENDPOINT: &str = "auth.php";

/// `auth.php` multiplexes every operation on an `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    DoctorLogin,
    A1Login,
    DoctorRegister,
    DoctorResetPassword,
    A1ResetPassword,
    GetPendingDoctors,
    ApproveDoctor,
    DeclineDoctor,
}

impl AuthAction {
    pub fn login_for(user_type: UserType) -> Self {
        match user_type {
            UserType::Doctor => AuthAction::DoctorLogin,
            UserType::A1User => AuthAction::A1Login,
        }
    }

    pub fn reset_for(user_type: UserType) -> Self {
        match user_type {
            UserType::Doctor => AuthAction::DoctorResetPassword,
            UserType::A1User => AuthAction::A1ResetPassword,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub action: AuthAction,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    #[serde(rename = "userType", default)]
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub specialization: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterBody<'a> {
    pub action: AuthAction,
    #[serde(flatten)]
    pub doctor: &'a RegisterDoctorRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub action: AuthAction,
    pub email: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorActionRequest<'a> {
    pub action: AuthAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// A doctor registration awaiting lab approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingDoctor {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_approved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingDoctorsResponse {
    #[serde(default)]
    pub doctors: Vec<PendingDoctor>,
}

// MySQL tinyint columns come back as 0/1, "0"/"1" or booleans.
fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}
