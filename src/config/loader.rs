//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = Self::expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in the format ${VAR_NAME} or
    /// ${VAR_NAME:-default}. An unset variable without a default keeps
    /// its placeholder.
    fn expand_env_vars(content: &str) -> String {
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").unwrap();
        let mut last_match = 0;
        let mut result = String::with_capacity(content.len());

        for cap in re.captures_iter(content) {
            let full_match = cap.get(0).unwrap();
            let var_name = cap.get(1).unwrap().as_str();

            result.push_str(&content[last_match..full_match.start()]);

            let value = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match cap.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => full_match.as_str().to_string(),
                },
            };
            result.push_str(&value);

            last_match = full_match.end();
        }

        result.push_str(&content[last_match..]);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("BLOBWRITR_TEST_VAR", "test_value");
        let content = "key: ${BLOBWRITR_TEST_VAR}";
        let expanded = ConfigLoader::expand_env_vars(content);
        assert_eq!(expanded, "key: test_value");
        std::env::remove_var("BLOBWRITR_TEST_VAR");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("BLOBWRITR_MISSING_VAR");
        let expanded = ConfigLoader::expand_env_vars("key: ${BLOBWRITR_MISSING_VAR:-fallback}");
        assert_eq!(expanded, "key: fallback");
    }

    #[test]
    fn test_unset_var_without_default_keeps_placeholder() {
        std::env::remove_var("BLOBWRITR_MISSING_VAR");
        let expanded = ConfigLoader::expand_env_vars("key: ${BLOBWRITR_MISSING_VAR}");
        assert_eq!(expanded, "key: ${BLOBWRITR_MISSING_VAR}");
    }

    #[test]
    fn test_load_expands_and_validates() {
        std::env::set_var("BLOBWRITR_TEST_ENDPOINT", "https://storage.example.com");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
endpoint:
  url: "${{BLOBWRITR_TEST_ENDPOINT}}"
upload:
  chunk_size: 1048576
"#
        )
        .unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.endpoint.url, "https://storage.example.com");
        assert_eq!(config.upload.chunk_size, 1048576);

        std::env::remove_var("BLOBWRITR_TEST_ENDPOINT");
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
endpoint:
  url: "not-a-url"
"#
        )
        .unwrap();

        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
