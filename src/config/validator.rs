//! Config validation: page sizes must be usable together.

use crate::config::ApiConfig;
use crate::error::ConfigError;

pub fn validate(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.maximum_page_size == 0 {
        return Err(ConfigError::Validation("maximum_page_size must be at least 1".into()));
    }
    if config.default_page_size == 0 || config.default_page_size > config.maximum_page_size {
        return Err(ConfigError::Validation(format!(
            "default_page_size must be between 1 and maximum_page_size ({}), got {}",
            config.maximum_page_size, config.default_page_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn zero_default_page_size_is_rejected() {
        let config = ApiConfig {
            default_page_size: 0,
            ..ApiConfig::default()
        };
        assert!(validate(&config).is_err());
    }
}
