use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::models::{
    ApiConfig, BackendConfig, FacilityTableConfig, KnowledgeConfig, MapsConfig, NotifierConfig,
    ObservabilityConfig, ResolversConfig, TextUnderstandingConfig,
};
use super::validation::ConfigValidator;
use super::ConfigResult;

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/responder.toml",
    "responder.toml",
    "/etc/responder/config.toml",
];

/// Process-wide configuration, constructed once at startup and shared read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub text_understanding: TextUnderstandingConfig,
    pub maps: MapsConfig,
    pub facility_table: FacilityTableConfig,
    pub knowledge: KnowledgeConfig,
    pub notifier: NotifierConfig,
    pub backend: BackendConfig,
    pub resolvers: ResolversConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Loads from `config_path` (or the first default path that exists),
    /// then applies `RESPONDER__SECTION__KEY` environment overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("config file not found: {path}"));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("RESPONDER")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration to TOML")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.text_understanding.validate()?;
        self.maps.validate()?;
        self.facility_table.validate()?;
        self.knowledge.validate()?;
        self.notifier.validate()?;
        self.backend.validate()?;
        self.resolvers.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::TextProvider;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.text_understanding.provider, TextProvider::Gemini);
        assert_eq!(config.maps.timeout_seconds, 5);
        assert_eq!(config.api.bind_address, "0.0.0.0:8100");
        assert!(config.backend.report_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_from_partial_toml() {
        let toml_str = r#"
[text_understanding]
provider = "openai_compatible"
api_base = "https://api.groq.com/openai/v1"
model = "llama3-70b-8192"

[resolvers]
hospital_cutoff_km = 20.0

[backend]
report_url = "http://localhost:3000/api/events"
"#;
        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(
            config.text_understanding.provider,
            TextProvider::OpenaiCompatible
        );
        assert_eq!(config.text_understanding.timeout_seconds, 10);
        assert_eq!(config.resolvers.hospital_cutoff_km, 20.0);
        assert_eq!(config.resolvers.fire_radius_meters, 5000);
        assert_eq!(
            config.backend.report_url.as_deref(),
            Some("http://localhost:3000/api/events")
        );
    }

    #[test]
    fn test_app_config_rejects_invalid_toml_values() {
        let toml_str = r#"
[maps]
timeout_seconds = 0
"#;
        assert!(AppConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
bind_address = "127.0.0.1:9100"

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.api.bind_address, "127.0.0.1:9100");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/responder.toml")).is_err());
    }

    #[test]
    fn test_to_toml_round_trips_defaults() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&rendered).unwrap();
        assert_eq!(parsed.resolvers.mailbox_capacity, config.resolvers.mailbox_capacity);
    }
}
