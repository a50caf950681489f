use url::Url;

use super::{ConfigError, ConfigResult};

pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

pub struct ValidationUtils;

impl ValidationUtils {
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    pub fn validate_timeout_seconds(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 300 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 300"
            )));
        }
        Ok(())
    }

    pub fn validate_count(count: usize, field_name: &str) -> ConfigResult<()> {
        if count == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > 10000 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 10000"
            )));
        }
        Ok(())
    }

    /// Radius must be positive and no larger than the directory maximum (50 km).
    pub fn validate_radius_meters(radius: u32, field_name: &str) -> ConfigResult<()> {
        if radius == 0 || radius > 50_000 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be between 1 and 50000 meters"
            )));
        }
        Ok(())
    }

    pub fn validate_url(value: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field_name)?;
        let parsed = Url::parse(value)
            .map_err(|e| ConfigError::Validation(format!("{field_name} is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "{field_name} must use http or https"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("gemini", "field").is_ok());
        assert!(ValidationUtils::validate_not_empty("", "field").is_err());
        assert!(ValidationUtils::validate_not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_timeout_seconds() {
        assert!(ValidationUtils::validate_timeout_seconds(5, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(300, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(0, "t").is_err());
        assert!(ValidationUtils::validate_timeout_seconds(301, "t").is_err());
    }

    #[test]
    fn test_validate_radius_meters() {
        assert!(ValidationUtils::validate_radius_meters(5000, "r").is_ok());
        assert!(ValidationUtils::validate_radius_meters(0, "r").is_err());
        assert!(ValidationUtils::validate_radius_meters(60_000, "r").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(ValidationUtils::validate_url("https://maps.googleapis.com/maps/api", "url").is_ok());
        assert!(ValidationUtils::validate_url("http://localhost:3000/api/events", "url").is_ok());
        assert!(ValidationUtils::validate_url("", "url").is_err());
        assert!(ValidationUtils::validate_url("localhost:3000", "url").is_err());
        assert!(ValidationUtils::validate_url("ftp://example.com", "url").is_err());
    }
}
