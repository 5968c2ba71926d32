use std::net::IpAddr;

use crate::forms::collect::ValidationPolicy;
use crate::forms::FormKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub admin_secret: String,
    pub jwt_secret: String,
    pub store: StoreConfig,
    pub validation: ValidationPolicy,
    /// Target field counts. `None` derives the target from the schema,
    /// counting conditional fields only while triggered.
    pub feedback_required: Option<usize>,
    pub survey_required: Option<usize>,
    pub max_body_size: usize,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Remote {
        base_url: String,
        auth_token: Option<String>,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let admin_secret = env_required("FORMSINK_ADMIN_SECRET")?;
        let jwt_secret = env_required("FORMSINK_JWT_SECRET")?;

        let host: IpAddr = env_or("FORMSINK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_HOST: {e}"))?;

        let port: u16 = env_or("FORMSINK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_PORT: {e}"))?;

        let store = match env_or("FORMSINK_STORE", "memory").as_str() {
            "memory" => StoreConfig::Memory,
            "remote" => StoreConfig::Remote {
                base_url: env_required("FORMSINK_STORE_URL")?,
                auth_token: std::env::var("FORMSINK_STORE_AUTH").ok(),
            },
            other => return Err(format!("Invalid FORMSINK_STORE: {other}")),
        };

        let validation = ValidationPolicy::parse(&env_or("FORMSINK_VALIDATION", "all"))
            .ok_or_else(|| "Invalid FORMSINK_VALIDATION (expected 'all' or 'any')".to_string())?;

        let feedback_required = env_optional_usize("FORMSINK_FEEDBACK_REQUIRED")?;
        let survey_required = env_optional_usize("FORMSINK_SURVEY_REQUIRED")?;

        let max_body_size: usize = env_or("FORMSINK_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("FORMSINK_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            admin_secret,
            jwt_secret,
            store,
            validation,
            feedback_required,
            survey_required,
            max_body_size,
            log_level,
        })
    }

    /// Configured target override for a form, if the operator pinned one.
    pub fn required_override(&self, form: FormKind) -> Option<usize> {
        match form {
            FormKind::Feedback => self.feedback_required,
            FormKind::Survey => self.survey_required,
        }
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional_usize(key: &str) -> Result<Option<usize>, String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| format!("Invalid {key}: {e}")),
        Err(_) => Ok(None),
    }
}
