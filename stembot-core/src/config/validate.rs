//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.server.base_url.trim().is_empty() {
        errors.push("server.base_url must not be empty".to_string());
    } else if !config.server.base_url.starts_with("http://")
        && !config.server.base_url.starts_with("https://")
    {
        errors.push("server.base_url must start with http:// or https://".to_string());
    }
    if config.server.default_model.trim().is_empty() {
        errors.push("server.default_model must not be empty".to_string());
    }
    if config.server.request_timeout_secs == 0 {
        errors.push("server.request_timeout_secs must be > 0".to_string());
    }
    if config.server.list_timeout_secs == 0 {
        errors.push("server.list_timeout_secs must be > 0".to_string());
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push("storage.data_dir must not be empty".to_string());
    }

    if config.chat.page_size == 0 {
        errors.push("chat.page_size must be > 0".to_string());
    }

    if !matches!(config.logging.format.as_str(), "text" | "json") {
        errors.push("logging.format must be 'text' or 'json'".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default();
        config.server.base_url = "localhost:11434".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_aggregates_multiple_errors() {
        let mut config = Config::default();
        config.server.request_timeout_secs = 0;
        config.chat.page_size = 0;
        let err = validate_config(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("request_timeout_secs"));
        assert!(message.contains("page_size"));
    }
}
