use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::ids::flexible_id;

/// The two roles the client serves: referring doctors and the central
/// aligner-fabrication admin ("A1").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserType {
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "a1_user", alias = "a1")]
    A1User,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Doctor => "doctor",
            UserType::A1User => "a1_user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(UserType::Doctor),
            "a1_user" | "a1" => Ok(UserType::A1User),
            other => Err(AppError::Validation(format!("Unknown user type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Everything the client needs to act on behalf of a logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthState {
    pub token: String,
    pub user: User,
    pub user_type: UserType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_type_wire_names() {
        assert_eq!(serde_json::to_value(UserType::A1User).unwrap(), json!("a1_user"));
        assert_eq!("doctor".parse::<UserType>().unwrap(), UserType::Doctor);
        assert_eq!("A1".parse::<UserType>().unwrap(), UserType::A1User);
        assert!("nurse".parse::<UserType>().is_err());
    }

    #[test]
    fn test_user_accepts_numeric_id() {
        let user: User = serde_json::from_value(json!({
            "id": 12,
            "name": "Dr. Rao",
            "email": "rao@clinic.test"
        }))
        .unwrap();

        assert_eq!(user.id, "12");
        assert_eq!(user.display_name(), "Dr. Rao");
    }
}
