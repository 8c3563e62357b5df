use crate::core::session::DEFAULT_PAGE_SIZE;
use crate::core::sort::SortKey;
use crate::domain::ports::BackendSettings;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_BUCKET: &str = "public-assets";
pub const DEFAULT_CACHE_CONTROL_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub cache_control_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowseConfig {
    pub page_size: Option<usize>,
    pub default_sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SKILLSWAP_ANON_KEY})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static VAR: OnceLock<Regex> = OnceLock::new();
        let re = VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("backend.url", &self.backend.url)?;

        if self.backend.anon_key.contains("${") {
            return Err(MarketError::MissingConfig {
                field: "backend.anon_key".to_string(),
            });
        }
        crate::utils::validation::validate_non_empty_string("backend.anon_key", &self.backend.anon_key)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            crate::utils::validation::validate_positive_number(
                "backend.timeout_seconds",
                timeout as usize,
                1,
            )?;
        }

        if let Some(page_size) = self.browse.page_size {
            crate::utils::validation::validate_positive_number("browse.page_size", page_size, 1)?;
        }

        if let Some(sort) = &self.browse.default_sort {
            sort.parse::<SortKey>()?;
        }

        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(MarketError::invalid_value(
                    "logging.level",
                    level,
                    format!("Unsupported level. Valid levels: {}", valid_levels.join(", ")),
                ));
            }
        }

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.browse.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// 預設排序；未設定或無法解析時使用 relevance
    pub fn default_sort(&self) -> SortKey {
        self.browse
            .default_sort
            .as_deref()
            .and_then(|id| id.parse().ok())
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl BackendSettings for TomlConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn anon_key(&self) -> &str {
        &self.backend.anon_key
    }

    fn timeout_seconds(&self) -> u64 {
        self.backend.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn storage_bucket(&self) -> &str {
        self.storage.bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }

    fn cache_control_seconds(&self) -> u64 {
        self.storage
            .cache_control_seconds
            .unwrap_or(DEFAULT_CACHE_CONTROL_SECONDS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let toml_content = r#"
[backend]
url = "https://demo.example.co"
anon_key = "public-anon-key"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.backend_url(), "https://demo.example.co");
        assert_eq!(config.timeout_seconds(), 30);
        assert_eq!(config.storage_bucket(), "public-assets");
        assert_eq!(config.cache_control_seconds(), 3600);
        assert_eq!(config.page_size(), 12);
        assert_eq!(config.default_sort(), SortKey::Relevance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SKILLSWAP_TEST_ANON_KEY", "key-from-env");

        let toml_content = r#"
[backend]
url = "https://demo.example.co"
anon_key = "${SKILLSWAP_TEST_ANON_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.anon_key(), "key-from-env");

        std::env::remove_var("SKILLSWAP_TEST_ANON_KEY");
    }

    #[test]
    fn test_unresolved_key_is_missing_config() {
        let toml_content = r#"
[backend]
url = "https://demo.example.co"
anon_key = "${SKILLSWAP_TEST_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(MarketError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let bad_url = r#"
[backend]
url = "invalid-url"
anon_key = "k"
"#;
        assert!(TomlConfig::from_toml_str(bad_url).unwrap().validate().is_err());

        let bad_sort = r#"
[backend]
url = "https://demo.example.co"
anon_key = "k"

[browse]
default_sort = "cheapest"
"#;
        assert!(TomlConfig::from_toml_str(bad_sort).unwrap().validate().is_err());

        let bad_level = r#"
[backend]
url = "https://demo.example.co"
anon_key = "k"

[logging]
level = "loud"
"#;
        assert!(TomlConfig::from_toml_str(bad_level).unwrap().validate().is_err());

        let zero_page = r#"
[backend]
url = "https://demo.example.co"
anon_key = "k"

[browse]
page_size = 0
"#;
        assert!(TomlConfig::from_toml_str(zero_page).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[backend]
url = "https://demo.example.co"
anon_key = "k"
timeout_seconds = 10

[storage]
bucket = "uploads"

[browse]
page_size = 6
default_sort = "price-low"

[logging]
level = "debug"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.timeout_seconds(), 10);
        assert_eq!(config.storage_bucket(), "uploads");
        assert_eq!(config.page_size(), 6);
        assert_eq!(config.default_sort(), SortKey::PriceLowToHigh);
        assert_eq!(config.log_level(), Some("debug"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TomlConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, MarketError::Io(_)));
    }
}
