use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_gateway::{BackendClient, Session};
use shared_models::{AuthState, User, UserType};

pub struct TestConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/dental-management-system/backend/api".to_string(),
            request_timeout_secs: 5,
        }
    }
}

impl TestConfig {
    /// Points the client at a mock server root.
    pub fn for_server(uri: &str) -> Self {
        Self {
            api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
            ..AppConfig::default()
        }
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

impl TestUser {
    pub fn new(id: &str, email: &str, user_type: UserType) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Test {}", user_type),
            email: email.to_string(),
            user_type,
        }
    }

    pub fn doctor(id: &str) -> Self {
        Self::new(id, "doctor@clinic.test", UserType::Doctor)
    }

    pub fn a1(id: &str) -> Self {
        Self::new(id, "a1@aligners.test", UserType::A1User)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            phone: None,
            specialization: None,
            created_at: None,
        }
    }

    pub fn to_auth_state(&self, token: &str) -> AuthState {
        AuthState {
            token: token.to_string(),
            user: self.to_user(),
            user_type: self.user_type,
        }
    }

    /// In-memory session already logged in as this user.
    pub fn session(&self, token: &str) -> Arc<Session> {
        let session = Session::in_memory();
        session
            .establish(self.to_auth_state(token))
            .expect("in-memory session store never fails");
        Arc::new(session)
    }
}

pub fn test_client(uri: &str, session: Arc<Session>) -> Arc<BackendClient> {
    let config = TestConfig::for_server(uri).to_app_config();
    Arc::new(BackendClient::new(&config, session).expect("test client builds"))
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn ok() -> Value {
        json!({ "success": true })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "success": false, "error": message })
    }

    pub fn login_response(user: &TestUser, token: &str) -> Value {
        json!({
            "success": true,
            "token": token,
            "user": {
                "id": user.id.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(user.id.clone())),
                "name": user.name,
                "email": user.email
            },
            "userType": user.user_type.as_str()
        })
    }

    pub fn patient_response(patient_id: i64, doctor_id: i64, status: &str) -> Value {
        json!({
            "id": patient_id,
            "doctor_id": doctor_id,
            "name": "Asha Verma",
            "contact_number": "9876543210",
            "location": "12 MG Road, Pune",
            "age": 29,
            "gender": "female",
            "chief_complaint": "Crowding",
            "medical_history": "",
            "status": status,
            "scan_date": null,
            "scan_time": null,
            "doctor_name": "Dr. Test",
            "photos": [],
            "created_at": "2024-03-01 09:00:00"
        })
    }

    pub fn scheduled_patient(patient_id: i64, status: &str, scan_date: &str, scan_time: &str) -> Value {
        let mut patient = Self::patient_response(patient_id, 1, status);
        patient["scan_date"] = json!(scan_date);
        patient["scan_time"] = json!(scan_time);
        patient
    }

    /// One day of slots; `slots` is a list of (time, available).
    pub fn day_slots(date: &str, slots: &[(&str, bool)]) -> Value {
        json!({
            "date": date,
            "slots": slots
                .iter()
                .map(|(time, available)| json!({ "time": time, "available": available }))
                .collect::<Vec<_>>()
        })
    }

    pub fn slots_response(days: Vec<Value>) -> Value {
        json!({ "success": true, "slots": days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::for_server("http://127.0.0.1:4010").to_app_config();

        assert_eq!(config.api_base_url, "http://127.0.0.1:4010");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.slot_poll_interval_secs, 10);
    }

    #[test]
    fn test_user_session() {
        let user = TestUser::doctor("11");
        let session = user.session("tok");

        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.current().unwrap().user.id, "11");
    }

    #[test]
    fn test_login_response_uses_numeric_id_when_possible() {
        let body = MockBackendResponses::login_response(&TestUser::a1("4"), "t");

        assert_eq!(body["user"]["id"], json!(4));
        assert_eq!(body["userType"], json!("a1_user"));
    }
}
