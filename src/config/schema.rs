use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{get_cache_path, CacheConfig};
use crate::fetch::FetchConfig;
use crate::output::OutputFormat;
use crate::scoring::{validate_scoring, ScoringConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub fetch: FetchSection,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, e.g. "30s"
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,

    #[serde(default = "default_request_interval")]
    pub request_interval: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            request_interval: default_request_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Defaults to the platform cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> String {
    "2s".to_string()
}

fn default_request_interval() -> String {
    "300ms".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Config {
    /// Check every section and return all problems at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            errors.push(format!(
                "api.base_url: '{}' must start with http:// or https://",
                self.api.base_url
            ));
        }
        if let Err(e) = parse_duration("api.timeout", &self.api.timeout) {
            errors.push(e);
        }

        if self.fetch.max_attempts == 0 {
            errors.push("fetch.max_attempts: must be at least 1".to_string());
        }
        if let Err(e) = parse_duration("fetch.retry_delay", &self.fetch.retry_delay) {
            errors.push(e);
        }
        if let Err(e) = parse_duration("fetch.request_interval", &self.fetch.request_interval) {
            errors.push(e);
        }

        if let Err(scoring_errors) = validate_scoring(&self.scoring) {
            errors.extend(scoring_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Per-request HTTP timeout. Falls back to 30s if unparseable.
    pub fn timeout(&self) -> Duration {
        parse_duration("api.timeout", &self.api.timeout).unwrap_or(Duration::from_secs(30))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            max_attempts: self.fetch.max_attempts.max(1),
            retry_delay: parse_duration("fetch.retry_delay", &self.fetch.retry_delay)
                .unwrap_or(defaults.retry_delay),
            request_interval: parse_duration("fetch.request_interval", &self.fetch.request_interval)
                .unwrap_or(defaults.request_interval),
        }
    }

    /// `no_cache` is the `--no-cache` flag and overrides the file
    pub fn cache_config(&self, no_cache: bool) -> CacheConfig {
        CacheConfig {
            enabled: self.cache.enabled && !no_cache,
            path: self.cache.dir.clone().unwrap_or_else(get_cache_path),
        }
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value.trim())
        .map_err(|e| format!("{}: invalid duration '{}': {}", field, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fetch_config(), FetchConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
api:
  base_url: "http://localhost:8000/ergast/f1"
  timeout: "10s"
fetch:
  max_attempts: 5
  retry_delay: "500ms"
  request_interval: "1s"
scoring:
  preset: "2003-2009"
cache:
  enabled: false
  dir: /tmp/f1-cache
output:
  dir: exports
  format: json
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.fetch_config(),
            FetchConfig {
                max_attempts: 5,
                retry_delay: Duration::from_millis(500),
                request_interval: Duration::from_secs(1),
            }
        );
        assert_eq!(config.scoring.preset.as_deref(), Some("2003-2009"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.dir, PathBuf::from("exports"));

        let cache = config.cache_config(false);
        assert!(!cache.enabled);
        assert_eq!(cache.path, PathBuf::from("/tmp/f1-cache"));
    }

    #[test]
    fn test_no_cache_flag_overrides_file() {
        let config = Config::default();
        assert!(config.cache_config(false).enabled);
        assert!(!config.cache_config(true).enabled);
    }

    #[test]
    fn test_validate_collects_every_error() {
        let yaml = r#"
api:
  base_url: "ftp://example.com"
  timeout: "soon"
fetch:
  max_attempts: 0
  retry_delay: "2 fortnights"
scoring:
  preset: "1950"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();

        let errors = config.validate().unwrap_err();

        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.iter().any(|e| e.starts_with("api.base_url")));
        assert!(errors.iter().any(|e| e.starts_with("api.timeout")));
        assert!(errors.iter().any(|e| e.starts_with("fetch.max_attempts")));
        assert!(errors.iter().any(|e| e.starts_with("fetch.retry_delay")));
        assert!(errors.iter().any(|e| e.contains("1950")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("fetch:\n  retries: 3\n");
        assert!(result.is_err());
    }
}
