use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/dental-management-system/backend/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub slot_poll_interval_secs: u64,
    pub slot_query_weeks: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub closed_weekday: u32,
    pub session_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            slot_poll_interval_secs: 10,
            slot_query_weeks: 1,
            closed_weekday: 0,
            session_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("DENTAL_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("DENTAL_API_BASE_URL not set, using default");
                    defaults.api_base_url.clone()
                }),
            request_timeout_secs: parse_var("DENTAL_API_TIMEOUT_SECS", defaults.request_timeout_secs),
            slot_poll_interval_secs: parse_var("SLOT_POLL_INTERVAL_SECS", defaults.slot_poll_interval_secs),
            slot_query_weeks: parse_var("SLOT_QUERY_WEEKS", defaults.slot_query_weeks),
            closed_weekday: parse_var("CLINIC_CLOSED_WEEKDAY", defaults.closed_weekday),
            session_file: env::var("DENTAL_SESSION_FILE").ok().map(PathBuf::from),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.closed_weekday > 6 {
            warn!("CLINIC_CLOSED_WEEKDAY {} out of range, using Sunday", config.closed_weekday);
            return Self { closed_weekday: 0, ..config };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn slot_poll_interval(&self) -> Duration {
        Duration::from_secs(self.slot_poll_interval_secs.max(1))
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using {}", name, default);
            default
        }
    }
}
