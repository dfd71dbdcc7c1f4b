pub mod cli;
pub mod llm;
pub mod meta;
pub mod toml_config;

use crate::config::llm::{LlmConfig, LlmOverrides, Platform};
use crate::config::toml_config::{DataConfig, OutputConfig, TomlConfig};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use serde::Serialize;

pub const DEFAULT_CARDS_PATH: &str = "data/tarot_cards.json";
pub const DEFAULT_META_PATH: &str = "data/tarot_meta.json";
pub const DEFAULT_IMAGES_DIR: &str = "cards";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

#[cfg(feature = "cli")]
pub use command_line::CliConfig;

#[cfg(feature = "cli")]
mod command_line {
    use crate::config::llm::{Backend, LlmOverrides};
    use crate::config::toml_config::{DataConfig, OutputConfig};
    use crate::core::{AgeBracket, Questioner, Sex};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "tarot-reader")]
    #[command(about = "Celtic Cross tarot reading with LLM interpretations")]
    pub struct CliConfig {
        /// Sex of the questioner
        #[arg(long, value_enum, default_value = "male")]
        pub sex: Sex,

        /// The questioner is 40 or older
        #[arg(long)]
        pub over_40: bool,

        /// The question is about someone or something other than the questioner
        #[arg(long)]
        pub about_others: bool,

        /// Question to read for
        #[arg(short, long, default_value = "")]
        pub query: String,

        /// Optional TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        #[arg(long)]
        pub cards: Option<String>,

        #[arg(long)]
        pub meta: Option<String>,

        #[arg(long)]
        pub images: Option<String>,

        #[arg(long)]
        pub output: Option<String>,

        /// Seed for a reproducible draw
        #[arg(long)]
        pub seed: Option<u64>,

        #[arg(long, value_enum)]
        pub backend: Option<Backend>,

        #[arg(long)]
        pub model: Option<String>,

        #[arg(long)]
        pub base_url: Option<String>,

        #[arg(long)]
        pub api_key: Option<String>,

        #[arg(long)]
        pub temperature: Option<f32>,

        /// Draw the cards without calling the language model
        #[arg(long)]
        pub no_narrative: bool,

        /// Do not write the HTML/JSON report
        #[arg(long)]
        pub no_report: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub log_json: bool,
    }

    impl CliConfig {
        pub fn questioner(&self) -> Questioner {
            Questioner {
                sex: self.sex,
                age: AgeBracket::from_over_40(self.over_40),
                self_directed: !self.about_others,
                query: self.query.clone(),
            }
        }

        /// A query was given but `--no-narrative` skips its translation.
        pub fn query_ignored(&self) -> bool {
            self.no_narrative && !self.query.trim().is_empty()
        }

        pub fn llm_overrides(&self) -> LlmOverrides {
            LlmOverrides {
                backend: self.backend,
                model: self.model.clone(),
                base_url: self.base_url.clone(),
                api_key: self.api_key.clone(),
                temperature: self.temperature,
            }
        }

        pub fn data_overrides(&self) -> DataConfig {
            DataConfig {
                cards: self.cards.clone(),
                meta: self.meta.clone(),
                images: self.images.clone(),
            }
        }

        pub fn output_overrides(&self) -> OutputConfig {
            OutputConfig {
                path: self.output.clone(),
                write_report: self.no_report.then_some(false),
            }
        }
    }
}

/// Final settings after merging command line, environment, TOML and defaults.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub cards_path: String,
    pub meta_path: String,
    pub images_dir: String,
    pub output_path: String,
    pub write_report: bool,
    pub llm: LlmConfig,
}

/// One configuration layer: command line, environment or file.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    pub llm: LlmOverrides,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl From<TomlConfig> for ConfigLayer {
    fn from(file: TomlConfig) -> Self {
        Self {
            llm: file.llm,
            data: file.data,
            output: file.output,
        }
    }
}

impl AppConfig {
    /// `layers` are ordered from highest to lowest precedence.
    pub fn resolve(layers: Vec<ConfigLayer>, platform: Platform) -> Self {
        let mut llm = LlmOverrides::default();
        let mut data = DataConfig::default();
        let mut output = OutputConfig::default();

        for layer in layers.into_iter().rev() {
            llm = layer.llm.or(llm);
            data = DataConfig {
                cards: layer.data.cards.or(data.cards),
                meta: layer.data.meta.or(data.meta),
                images: layer.data.images.or(data.images),
            };
            output = OutputConfig {
                path: layer.output.path.or(output.path),
                write_report: layer.output.write_report.or(output.write_report),
            };
        }

        Self {
            cards_path: data.cards.unwrap_or_else(|| DEFAULT_CARDS_PATH.to_string()),
            meta_path: data.meta.unwrap_or_else(|| DEFAULT_META_PATH.to_string()),
            images_dir: data.images.unwrap_or_else(|| DEFAULT_IMAGES_DIR.to_string()),
            output_path: output.path.unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            write_report: output.write_report.unwrap_or(true),
            llm: LlmConfig::resolve(llm, platform),
        }
    }
}

impl ConfigProvider for AppConfig {
    fn cards_path(&self) -> &str {
        &self.cards_path
    }

    fn meta_path(&self) -> &str {
        &self.meta_path
    }

    fn images_dir(&self) -> &str {
        &self.images_dir
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data.cards", &self.cards_path)?;
        validate_path("data.meta", &self.meta_path)?;
        validate_path("data.images", &self.images_dir)?;
        validate_path("output.path", &self.output_path)?;
        self.llm.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::llm::Backend;

    #[test]
    fn test_defaults_without_layers() {
        let config = AppConfig::resolve(vec![], Platform::MacOs);
        assert_eq!(config.cards_path(), DEFAULT_CARDS_PATH);
        assert_eq!(config.meta_path(), DEFAULT_META_PATH);
        assert_eq!(config.images_dir(), DEFAULT_IMAGES_DIR);
        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert!(config.write_report);
        assert_eq!(config.llm.backend, Backend::Ollama);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_precedence_cli_env_file() {
        let cli = ConfigLayer {
            llm: LlmOverrides {
                model: Some("from-cli".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = ConfigLayer {
            llm: LlmOverrides {
                model: Some("from-env".to_string()),
                api_key: Some("env-key".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let file = TomlConfig::from_toml_str(
            r#"
[llm]
backend = "lmstudio"
model = "from-file"
api_key = "file-key"

[data]
cards = "custom/cards.json"

[output]
write_report = false
"#,
        )
        .unwrap();

        let config = AppConfig::resolve(vec![cli, env, file.into()], Platform::MacOs);
        assert_eq!(config.llm.model, "from-cli");
        assert_eq!(config.llm.api_key, "env-key");
        assert_eq!(config.llm.backend, Backend::Lmstudio);
        assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(config.cards_path, "custom/cards.json");
        assert!(!config.write_report);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_no_narrative_ignores_query() {
        use clap::Parser;

        let cli = CliConfig::try_parse_from(["tarot-reader", "-q", "恋愛運", "--no-narrative"]).unwrap();
        assert!(cli.query_ignored());

        let cli = CliConfig::try_parse_from(["tarot-reader", "-q", "恋愛運"]).unwrap();
        assert!(!cli.query_ignored());

        let cli = CliConfig::try_parse_from(["tarot-reader", "--no-narrative"]).unwrap();
        assert!(!cli.query_ignored());
        assert!(cli.questioner().self_directed);
    }
}
