use crate::utils::error::{EnrichError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Optional `--config` file. Every key is optional; absent keys fall through
/// to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub http: HttpSection,
    pub adresmatch: AdresmatchSection,
    pub gebouwen: GebouwenSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_seconds: Option<f64>,
    pub rate_limit: Option<f64>,
    pub delay_seconds: Option<f64>,
    pub retries: Option<u32>,
    pub retry_wait_seconds: Option<f64>,
    pub auth: Option<String>,
    pub progress_interval: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdresmatchSection {
    pub api_url: Option<String>,
    pub rate_limit: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GebouwenSection {
    pub gebouwen_url: Option<String>,
    pub gebouweenheden_url: Option<String>,
    pub adres_id_field: Option<String>,
    pub building_limit: Option<usize>,
    pub include_historic: Option<bool>,
    pub rate_limit: Option<f64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EnrichError::ConfigError {
                message: format!("Config file not found: {}", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| EnrichError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Replaces `${VAR}` with the variable's value; unknown variables stay verbatim.
pub fn substitute_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sections() {
        let config = FileConfig::from_toml_str(
            r#"
[http]
timeout_seconds = 5
rate_limit = 2.5
retries = 1

[gebouwen]
adres_id_field = "adres_id"
include_historic = true
"#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_seconds, Some(5.0));
        assert_eq!(config.http.rate_limit, Some(2.5));
        assert_eq!(config.http.retries, Some(1));
        assert_eq!(config.http.auth, None);
        assert_eq!(config.adresmatch, AdresmatchSection::default());
        assert_eq!(config.gebouwen.adres_id_field.as_deref(), Some("adres_id"));
        assert_eq!(config.gebouwen.include_historic, Some(true));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ADRES_ENRICH_TEST_TOKEN", "s3cret");
        let config = FileConfig::from_toml_str(
            r#"
[http]
auth = "${ADRES_ENRICH_TEST_TOKEN}"

[adresmatch]
api_url = "${ADRES_ENRICH_TEST_UNSET_VAR}"
"#,
        )
        .unwrap();
        std::env::remove_var("ADRES_ENRICH_TEST_TOKEN");

        assert_eq!(config.http.auth.as_deref(), Some("s3cret"));
        assert_eq!(
            config.adresmatch.api_url.as_deref(),
            Some("${ADRES_ENRICH_TEST_UNSET_VAR}")
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FileConfig::from_toml_str("[http]\nrate = 3\n").unwrap_err();
        assert!(matches!(err, EnrichError::ConfigError { .. }));
    }

    #[test]
    fn test_example_config_parses() {
        let config = FileConfig::from_toml_str(include_str!("../../configs/enrich.example.toml"))
            .unwrap();
        assert_eq!(config.adresmatch.rate_limit, Some(25.0));
        assert_eq!(config.gebouwen.building_limit, Some(5));
        assert_eq!(config.http.auth, None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[adresmatch]\nrate_limit = 10").unwrap();
        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.adresmatch.rate_limit, Some(10.0));

        let missing = FileConfig::from_file("/no/such/enrich.toml").unwrap_err();
        assert_eq!(missing.exit_code(), 1);
    }
}
