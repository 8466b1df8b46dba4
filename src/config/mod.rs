//! Settings resolution: CLI flag > pipeline section > `[http]` > built-in default.

#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::client::{ClientSettings, RetryPolicy};
use crate::registry::adresmatch::DEFAULT_API_URL;
use crate::registry::gebouwen::{
    GebouwenSettings, DEFAULT_GEBOUWEENHEDEN_URL, DEFAULT_GEBOUWEN_URL,
};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative, validate_positive_number, validate_url,
    Validate,
};
use std::time::Duration;
use toml_config::{FileConfig, HttpSection};

pub const DEFAULT_TIMEOUT_SECONDS: f64 = 20.0;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_WAIT_SECONDS: f64 = 1.0;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;
pub const DEFAULT_ADRESMATCH_RATE: f64 = 25.0;
pub const DEFAULT_GEBOUWEN_RATE: f64 = 5.0;
pub const DEFAULT_ADRES_ID_FIELD: &str = "adresmatch_adres_id";
pub const DEFAULT_BUILDING_LIMIT: usize = 5;

/// HTTP and progress values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpOverrides {
    pub timeout_seconds: Option<f64>,
    pub rate_limit: Option<f64>,
    pub delay_seconds: Option<f64>,
    pub retries: Option<u32>,
    pub retry_wait_seconds: Option<f64>,
    pub auth: Option<String>,
    pub progress_interval: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub timeout_seconds: f64,
    pub rate_limit: f64,
    pub delay_seconds: f64,
    pub retries: u32,
    pub retry_wait_seconds: f64,
    /// Full `Authorization` header value.
    pub authorization: Option<String>,
    pub progress_interval: usize,
}

/// A bare token becomes `Bearer <token>`; a value with a scheme is kept.
pub fn normalize_authorization(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else if value.contains(char::is_whitespace) {
        Some(value.to_string())
    } else {
        Some(format!("Bearer {}", value))
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl HttpSettings {
    pub fn resolve(
        cli: &HttpOverrides,
        file: &HttpSection,
        section_rate: Option<f64>,
        default_rate: f64,
    ) -> Self {
        Self {
            timeout_seconds: cli
                .timeout_seconds
                .or(file.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            rate_limit: cli
                .rate_limit
                .or(section_rate)
                .or(file.rate_limit)
                .unwrap_or(default_rate),
            delay_seconds: cli.delay_seconds.or(file.delay_seconds).unwrap_or(0.0),
            retries: cli.retries.or(file.retries).unwrap_or(DEFAULT_RETRIES),
            retry_wait_seconds: cli
                .retry_wait_seconds
                .or(file.retry_wait_seconds)
                .unwrap_or(DEFAULT_RETRY_WAIT_SECONDS),
            authorization: cli
                .auth
                .as_deref()
                .or(file.auth.as_deref())
                .and_then(normalize_authorization),
            progress_interval: cli
                .progress_interval
                .or(file.progress_interval)
                .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: seconds(self.timeout_seconds),
            authorization: self.authorization.clone(),
            retry: RetryPolicy {
                retries: self.retries,
                wait: seconds(self.retry_wait_seconds),
            },
        }
    }

    pub fn delay(&self) -> Duration {
        seconds(self.delay_seconds)
    }
}

impl Validate for HttpSettings {
    fn validate(&self) -> Result<()> {
        validate_non_negative("timeout", self.timeout_seconds)?;
        if self.timeout_seconds == 0.0 {
            return Err(EnrichError::InvalidConfigValueError {
                field: "timeout".to_string(),
                value: self.timeout_seconds.to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }
        validate_non_negative("rate-limit", self.rate_limit)?;
        validate_non_negative("delay", self.delay_seconds)?;
        validate_non_negative("retry-wait", self.retry_wait_seconds)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdresmatchConfig {
    pub http: HttpSettings,
    pub api_url: String,
}

impl AdresmatchConfig {
    pub fn resolve(cli: &HttpOverrides, api_url: Option<String>, file: &FileConfig) -> Self {
        Self {
            http: HttpSettings::resolve(
                cli,
                &file.http,
                file.adresmatch.rate_limit,
                DEFAULT_ADRESMATCH_RATE,
            ),
            api_url: api_url
                .or_else(|| file.adresmatch.api_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }
}

impl Validate for AdresmatchConfig {
    fn validate(&self) -> Result<()> {
        self.http.validate()?;
        validate_url("api-url", &self.api_url)
    }
}

/// Building-stage values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GebouwenOverrides {
    pub gebouwen_url: Option<String>,
    pub gebouweenheden_url: Option<String>,
    pub adres_id_field: Option<String>,
    pub building_limit: Option<usize>,
    pub include_historic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GebouwenConfig {
    pub http: HttpSettings,
    pub api: GebouwenSettings,
    pub adres_id_field: String,
}

impl GebouwenConfig {
    pub fn resolve(cli: &HttpOverrides, overrides: GebouwenOverrides, file: &FileConfig) -> Self {
        let section = &file.gebouwen;
        Self {
            http: HttpSettings::resolve(cli, &file.http, section.rate_limit, DEFAULT_GEBOUWEN_RATE),
            api: GebouwenSettings {
                gebouwen_url: overrides
                    .gebouwen_url
                    .or_else(|| section.gebouwen_url.clone())
                    .unwrap_or_else(|| DEFAULT_GEBOUWEN_URL.to_string()),
                gebouweenheden_url: overrides
                    .gebouweenheden_url
                    .or_else(|| section.gebouweenheden_url.clone())
                    .unwrap_or_else(|| DEFAULT_GEBOUWEENHEDEN_URL.to_string()),
                building_limit: overrides
                    .building_limit
                    .or(section.building_limit)
                    .unwrap_or(DEFAULT_BUILDING_LIMIT),
                include_historic: overrides.include_historic
                    || section.include_historic.unwrap_or(false),
            },
            adres_id_field: overrides
                .adres_id_field
                .or_else(|| section.adres_id_field.clone())
                .unwrap_or_else(|| DEFAULT_ADRES_ID_FIELD.to_string()),
        }
    }
}

impl Validate for GebouwenConfig {
    fn validate(&self) -> Result<()> {
        self.http.validate()?;
        validate_url("gebouwen-url", &self.api.gebouwen_url)?;
        validate_url("gebouweenheden-url", &self.api.gebouweenheden_url)?;
        validate_positive_number("building-limit", self.api.building_limit, 1)?;
        validate_non_empty_string("adres-id-field", &self.adres_id_field)
    }
}
