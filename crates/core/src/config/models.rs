use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigValidator, ValidationUtils};
use super::{ConfigError, ConfigResult};
use crate::models::ServiceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextProvider {
    Gemini,
    /// Any `/chat/completions` endpoint (Groq, OpenAI, vLLM).
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextUnderstandingConfig {
    pub provider: TextProvider,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    /// Model used for ambulance tier classification; falls back to `model`.
    pub tier_model: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for TextUnderstandingConfig {
    fn default() -> Self {
        Self {
            provider: TextProvider::Gemini,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            tier_model: None,
            temperature: 0.3,
            timeout_seconds: 10,
        }
    }
}

impl TextUnderstandingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ConfigValidator for TextUnderstandingConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_url(&self.api_base, "text_understanding.api_base")?;
        ValidationUtils::validate_not_empty(&self.model, "text_understanding.model")?;
        if let Some(tier_model) = &self.tier_model {
            ValidationUtils::validate_not_empty(tier_model, "text_understanding.tier_model")?;
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(
                "text_understanding.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        ValidationUtils::validate_timeout_seconds(
            self.timeout_seconds,
            "text_understanding.timeout_seconds",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_base: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    pub reverse_timeout_seconds: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://maps.googleapis.com/maps/api".to_string(),
            api_key: String::new(),
            timeout_seconds: 5,
            reverse_timeout_seconds: 5,
        }
    }
}

impl ConfigValidator for MapsConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_url(&self.api_base, "maps.api_base")?;
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "maps.timeout_seconds")?;
        ValidationUtils::validate_timeout_seconds(
            self.reverse_timeout_seconds,
            "maps.reverse_timeout_seconds",
        )
    }
}

/// PostgREST-style facility table used for ambulance candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityTableConfig {
    /// When unset, ambulances are looked up through the maps directory.
    pub url: Option<String>,
    pub api_key: String,
    pub table: String,
    pub service_type: String,
    pub timeout_seconds: u64,
}

impl Default for FacilityTableConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: String::new(),
            table: "facilities".to_string(),
            service_type: "paramedic".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl ConfigValidator for FacilityTableConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(url) = &self.url {
            ValidationUtils::validate_url(url, "facility_table.url")?;
            ValidationUtils::validate_not_empty(&self.table, "facility_table.table")?;
            ValidationUtils::validate_not_empty(&self.service_type, "facility_table.service_type")?;
        }
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "facility_table.timeout_seconds")
    }
}

/// Reference-document similarity search used for hospital care categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// When unset, care categories are classified without reference context.
    pub url: Option<String>,
    pub api_key: String,
    pub rpc_function: String,
    pub top_k: usize,
    pub timeout_seconds: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: String::new(),
            rpc_function: "match_medical_docs".to_string(),
            top_k: 5,
            timeout_seconds: 10,
        }
    }
}

impl ConfigValidator for KnowledgeConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(url) = &self.url {
            ValidationUtils::validate_url(url, "knowledge.url")?;
            ValidationUtils::validate_not_empty(&self.rpc_function, "knowledge.rpc_function")?;
        }
        ValidationUtils::validate_count(self.top_k, "knowledge.top_k")?;
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "knowledge.timeout_seconds")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub enabled: bool,
    pub api_base: String,
    pub auth_token: String,
    pub phone_number_id: String,
    pub recipient_number: String,
    pub timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://api.vapi.ai".to_string(),
            auth_token: String::new(),
            phone_number_id: String::new(),
            recipient_number: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl ConfigValidator for NotifierConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled {
            ValidationUtils::validate_url(&self.api_base, "notifier.api_base")?;
            ValidationUtils::validate_not_empty(&self.auth_token, "notifier.auth_token")?;
            ValidationUtils::validate_not_empty(&self.phone_number_id, "notifier.phone_number_id")?;
            ValidationUtils::validate_not_empty(&self.recipient_number, "notifier.recipient_number")?;
        }
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "notifier.timeout_seconds")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// When unset, reports are only logged.
    pub report_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            report_url: None,
            timeout_seconds: 10,
        }
    }
}

impl ConfigValidator for BackendConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(url) = &self.report_url {
            ValidationUtils::validate_url(url, "backend.report_url")?;
        }
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "backend.timeout_seconds")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolversConfig {
    pub fire_radius_meters: u32,
    pub police_radius_meters: u32,
    pub ambulance_radius_meters: u32,
    pub hospital_radius_meters: u32,
    /// Hospitals farther than this are excluded before ranking.
    pub hospital_cutoff_km: f64,
    /// Rating assumed for hospitals the directory did not rate.
    pub default_rating: f64,
    pub mailbox_capacity: usize,
    pub lookup_timeout_seconds: u64,
    pub police_contact_enrichment: bool,
}

impl Default for ResolversConfig {
    fn default() -> Self {
        Self {
            fire_radius_meters: 5000,
            police_radius_meters: 5000,
            ambulance_radius_meters: 15000,
            hospital_radius_meters: 15000,
            hospital_cutoff_km: 15.0,
            default_rating: 3.0,
            mailbox_capacity: 64,
            lookup_timeout_seconds: 5,
            police_contact_enrichment: true,
        }
    }
}

impl ResolversConfig {
    pub fn radius_for(&self, category: ServiceCategory) -> u32 {
        match category {
            ServiceCategory::Fire => self.fire_radius_meters,
            ServiceCategory::Police => self.police_radius_meters,
            ServiceCategory::Ambulance => self.ambulance_radius_meters,
            ServiceCategory::Hospital => self.hospital_radius_meters,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds)
    }
}

impl ConfigValidator for ResolversConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_radius_meters(self.fire_radius_meters, "resolvers.fire_radius_meters")?;
        ValidationUtils::validate_radius_meters(self.police_radius_meters, "resolvers.police_radius_meters")?;
        ValidationUtils::validate_radius_meters(
            self.ambulance_radius_meters,
            "resolvers.ambulance_radius_meters",
        )?;
        ValidationUtils::validate_radius_meters(
            self.hospital_radius_meters,
            "resolvers.hospital_radius_meters",
        )?;
        if self.hospital_cutoff_km.is_nan() || self.hospital_cutoff_km <= 0.0 {
            return Err(ConfigError::Validation(
                "resolvers.hospital_cutoff_km must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=5.0).contains(&self.default_rating) {
            return Err(ConfigError::Validation(
                "resolvers.default_rating must be between 0.0 and 5.0".to_string(),
            ));
        }
        ValidationUtils::validate_count(self.mailbox_capacity, "resolvers.mailbox_capacity")?;
        ValidationUtils::validate_timeout_seconds(
            self.lookup_timeout_seconds,
            "resolvers.lookup_timeout_seconds",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8100".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled {
            ValidationUtils::validate_not_empty(&self.bind_address, "api.bind_address")?;
            self.bind_address.parse::<std::net::SocketAddr>().map_err(|e| {
                ConfigError::Validation(format!("api.bind_address is not a socket address: {e}"))
            })?;
        }
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "api.request_timeout_seconds",
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// One of `text`, `json`, `pretty`.
    pub log_format: String,
    pub metrics_enabled: bool,
    pub metrics_bind_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_bind_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "observability.log_level must be one of: {valid_levels:?}"
            )));
        }
        let valid_formats = ["text", "json", "pretty"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "observability.log_format must be one of: {valid_formats:?}"
            )));
        }
        if self.metrics_enabled {
            self.metrics_bind_address
                .parse::<std::net::SocketAddr>()
                .map_err(|e| {
                    ConfigError::Validation(format!(
                        "observability.metrics_bind_address is not a socket address: {e}"
                    ))
                })?;
        }
        Ok(())
    }
}
