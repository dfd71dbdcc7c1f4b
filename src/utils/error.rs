use thiserror::Error;

#[derive(Error, Debug)]
pub enum TarotError {
    #[error("Card data unavailable: {message}")]
    DataUnavailable { message: String },

    #[error("Insufficient card pool: {available} cards available, {required} required")]
    InsufficientPool { available: usize, required: usize },

    #[error("Malformed card record at position {position}: {reason}")]
    MalformedRecord { position: usize, reason: String },

    #[error("Reading contract violated: {message}")]
    ContractViolation { message: String },

    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Reading,
    Collaborator,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TarotError {
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable {
            message: message.into(),
        }
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DataUnavailable { .. } | Self::MalformedRecord { .. } => ErrorCategory::Data,
            Self::InsufficientPool { .. } | Self::ContractViolation { .. } => {
                ErrorCategory::Reading
            }
            Self::Collaborator { .. } | Self::ApiError(_) => ErrorCategory::Collaborator,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MalformedRecord { .. } => ErrorSeverity::Low,
            Self::Collaborator { .. } | Self::ApiError(_) => ErrorSeverity::Medium,
            Self::DataUnavailable { .. }
            | Self::InsufficientPool { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::ContractViolation { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Data => "確認 tarot_cards.json 是否存在且為卡片物件的陣列",
            ErrorCategory::Reading => "檢查卡片資料數量是否足夠（至少需要 11 張）",
            ErrorCategory::Collaborator => "確認 LLM 伺服器 (Ollama / LM Studio) 已啟動且 base URL 正確",
            ErrorCategory::Io => "檢查檔案路徑與讀寫權限",
            ErrorCategory::Configuration => "檢查命令列參數、環境變數與 TOML 設定檔",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DataUnavailable { .. } => {
                "カードデータが読み込めていません。JSON データを確認ください。".to_string()
            }
            Self::InsufficientPool {
                available,
                required,
            } => format!(
                "スプレッドに必要なカードが足りません（{} 枚中 {} 枚必要）。",
                available, required
            ),
            Self::Collaborator { service, .. } => {
                format!("{} に接続できませんでした。", service)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TarotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        let pool = TarotError::InsufficientPool {
            available: 3,
            required: 10,
        };
        assert_eq!(pool.category(), ErrorCategory::Reading);
        assert_eq!(pool.severity(), ErrorSeverity::High);

        let violation = TarotError::contract("duplicate card");
        assert!(violation.severity() > pool.severity());

        let outage = TarotError::collaborator("narrator", "connection refused");
        assert_eq!(outage.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_user_friendly_message_mentions_counts() {
        let err = TarotError::InsufficientPool {
            available: 7,
            required: 10,
        };
        let msg = err.user_friendly_message();
        assert!(msg.contains('7'));
        assert!(msg.contains("10"));
    }
}
