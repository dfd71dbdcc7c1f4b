use crate::config::llm::LlmOverrides;
use crate::utils::error::{Result, TarotError};
use crate::utils::validation::{validate_path, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 選用的 TOML 設定檔，優先順序低於命令列與環境變數
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub llm: LlmOverrides,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub cards: Option<String>,
    pub meta: Option<String>,
    pub images: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub write_report: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TarotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TarotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TarotError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.llm.base_url {
            validate_url("llm.base_url", base_url)?;
        }
        for (field, value) in [
            ("data.cards", &self.data.cards),
            ("data.meta", &self.data.meta),
            ("data.images", &self.data.images),
            ("output.path", &self.output.path),
        ] {
            if let Some(path) = value {
                validate_path(field, path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::llm::Backend;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[llm]
backend = "lmstudio"
model = "gemma-3-12b"
temperature = 0.5

[data]
cards = "assets/cards.json"
images = "assets/cards"

[output]
path = "./readings"
write_report = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.llm.backend, Some(Backend::Lmstudio));
        assert_eq!(config.llm.model.as_deref(), Some("gemma-3-12b"));
        assert_eq!(config.llm.temperature, Some(0.5));
        assert_eq!(config.data.cards.as_deref(), Some("assets/cards.json"));
        assert!(config.data.meta.is_none());
        assert_eq!(config.output.write_report, Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.llm.backend.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TAROT_TEST_BASE_URL", "http://192.168.0.10:1234/v1");

        let config = TomlConfig::from_toml_str(
            r#"
[llm]
base_url = "${TAROT_TEST_BASE_URL}"
api_key = "${TAROT_TEST_UNSET_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.llm.base_url.as_deref(), Some("http://192.168.0.10:1234/v1"));
        assert_eq!(config.llm.api_key.as_deref(), Some("${TAROT_TEST_UNSET_KEY}"));

        std::env::remove_var("TAROT_TEST_BASE_URL");
    }

    #[test]
    fn test_invalid_values() {
        let config = TomlConfig::from_toml_str("[llm]\nbase_url = \"not-a-url\"\n").unwrap();
        assert!(config.validate().is_err());

        assert!(TomlConfig::from_toml_str("[llm]\nbackend = \"openai\"\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[data]\ncards = \"data/tarot_cards.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data.cards.as_deref(), Some("data/tarot_cards.json"));
    }
}
