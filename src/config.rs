// src/config.rs

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::errors::AppError;
use crate::staging::DEFAULT_MAX_ATTACHMENTS;

pub const DEFAULT_PRODUCT_API_URL: &str = "https://api-car-export.vercel.app/api/product/add";
pub const DEFAULT_LOGIN_URL: &str = "/Protected/LogIn";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_FORM_IDLE_MINUTES: u64 = 60;
const DEFAULT_MAX_UPLOAD_MB: usize = 100;
const DEFAULT_MAX_FORM_SESSIONS: u64 = 200;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub product_api_url: Url,
    pub login_url: String,
    pub bind_addr: SocketAddr,
    pub max_attachments: usize,
    pub form_idle: Duration,
    pub max_upload_bytes: usize,
    pub max_form_sessions: u64,
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            AppError::Configuration(format!("{} ma niepoprawną wartość: '{}'", key, value))
        }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Wczytuje konfigurację ze zmiennych środowiskowych (po `dotenv()`).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url_raw =
            lookup("PRODUCT_API_URL").unwrap_or_else(|| DEFAULT_PRODUCT_API_URL.to_string());
        let product_api_url = Url::parse(&api_url_raw).map_err(|e| {
            AppError::Configuration(format!("PRODUCT_API_URL '{}': {}", api_url_raw, e))
        })?;
        if !matches!(product_api_url.scheme(), "http" | "https") {
            return Err(AppError::Configuration(format!(
                "PRODUCT_API_URL musi być adresem http(s), otrzymano '{}'",
                api_url_raw
            )));
        }

        let login_url = lookup("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());

        let bind_addr = parse_var(
            "BIND_ADDR",
            lookup("BIND_ADDR"),
            DEFAULT_BIND_ADDR
                .parse::<SocketAddr>()
                .map_err(|e| AppError::Configuration(e.to_string()))?,
        )?;

        let max_attachments = parse_var(
            "MAX_ATTACHMENTS",
            lookup("MAX_ATTACHMENTS"),
            DEFAULT_MAX_ATTACHMENTS,
        )?;
        if max_attachments == 0 {
            return Err(AppError::Configuration(
                "MAX_ATTACHMENTS musi być większe od zera".to_string(),
            ));
        }

        let idle_minutes = parse_var(
            "FORM_IDLE_MINUTES",
            lookup("FORM_IDLE_MINUTES"),
            DEFAULT_FORM_IDLE_MINUTES,
        )?;
        let max_upload_mb = parse_var(
            "MAX_UPLOAD_MB",
            lookup("MAX_UPLOAD_MB"),
            DEFAULT_MAX_UPLOAD_MB,
        )?;

        let max_form_sessions = parse_var(
            "MAX_FORM_SESSIONS",
            lookup("MAX_FORM_SESSIONS"),
            DEFAULT_MAX_FORM_SESSIONS,
        )?;
        if max_form_sessions == 0 {
            return Err(AppError::Configuration(
                "MAX_FORM_SESSIONS musi być większe od zera".to_string(),
            ));
        }

        Ok(AppConfig {
            product_api_url,
            login_url,
            bind_addr,
            max_attachments,
            form_idle: Duration::from_secs(idle_minutes * 60),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            max_form_sessions,
        })
    }
}
