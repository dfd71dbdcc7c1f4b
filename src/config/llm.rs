use crate::utils::error::{Result, TarotError};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    Ollama,
    Lmstudio,
}

impl Backend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "lmstudio" => Some(Self::Lmstudio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Platform {
    MacOs,
    Wsl,
    Other(String),
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => f.write_str("macos"),
            Self::Wsl => f.write_str("wsl"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// WSL kernels mention `microsoft` or `wsl` in `/proc/version`.
pub fn is_wsl_kernel(proc_version: &str) -> bool {
    let lowered = proc_version.to_lowercase();
    lowered.contains("microsoft") || lowered.contains("wsl")
}

pub fn detect_platform() -> Platform {
    if cfg!(target_os = "macos") {
        return Platform::MacOs;
    }
    match std::fs::read_to_string("/proc/version") {
        Ok(version) if is_wsl_kernel(&version) => Platform::Wsl,
        _ => Platform::Other(std::env::consts::OS.to_string()),
    }
}

/// First IPv4 `nameserver` in resolv.conf; under WSL this is the Windows host.
pub fn nameserver_from_resolv_conf(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("nameserver"), Some(ip)) if ip.parse::<std::net::Ipv4Addr>().is_ok() => {
                Some(ip.to_string())
            }
            _ => None,
        }
    })
}

/// Gateway address from `ip route show default` output.
pub fn gateway_from_ip_route(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("default"), Some("via"), Some(ip)) if ip.parse::<std::net::Ipv4Addr>().is_ok() => {
                Some(ip.to_string())
            }
            _ => None,
        }
    })
}

fn default_gateway() -> Option<String> {
    let output = std::process::Command::new("ip")
        .args(["route", "show", "default"])
        .output()
        .map_err(|e| tracing::debug!("`ip route` unavailable: {}", e))
        .ok()?;
    if !output.status.success() {
        return None;
    }
    gateway_from_ip_route(&String::from_utf8_lossy(&output.stdout))
}

/// resolv.conf nameserver, then the default gateway, then loopback.
pub fn windows_host_ip() -> String {
    std::fs::read_to_string("/etc/resolv.conf")
        .ok()
        .and_then(|content| nameserver_from_resolv_conf(&content))
        .or_else(default_gateway)
        .unwrap_or_else(|| {
            tracing::warn!("Could not find the Windows host address, using 127.0.0.1");
            "127.0.0.1".to_string()
        })
}

/// Explicit settings from one configuration layer; `None` defers to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmOverrides {
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

impl LlmOverrides {
    /// Reads `LLM_BACKEND`, `LLM_MODEL`, `LLM_BASE_URL`, `OPENAI_API_KEY`
    /// and `LLM_TEMPERATURE`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let backend = match var("LLM_BACKEND") {
            Some(raw) => Some(Backend::parse(&raw).ok_or_else(|| {
                TarotError::InvalidConfigValueError {
                    field: "LLM_BACKEND".to_string(),
                    value: raw.clone(),
                    reason: "expected 'ollama' or 'lmstudio'".to_string(),
                }
            })?),
            None => None,
        };

        let temperature = match var("LLM_TEMPERATURE") {
            Some(raw) => Some(raw.trim().parse::<f32>().map_err(|e| {
                TarotError::InvalidConfigValueError {
                    field: "LLM_TEMPERATURE".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            backend,
            model: var("LLM_MODEL"),
            base_url: var("LLM_BASE_URL"),
            api_key: var("OPENAI_API_KEY"),
            temperature,
        })
    }

    /// Fills unset fields from `lower`.
    pub fn or(self, lower: LlmOverrides) -> Self {
        Self {
            backend: self.backend.or(lower.backend),
            model: self.model.or(lower.model),
            base_url: self.base_url.or(lower.base_url),
            api_key: self.api_key.or(lower.api_key),
            temperature: self.temperature.or(lower.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmConfig {
    pub backend: Backend,
    pub platform: Platform,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
}

pub const DEFAULT_TEMPERATURE: f32 = 0.9;

impl LlmConfig {
    /// Resolves the final settings from merged overrides, falling back to
    /// the backend's defaults for this platform.
    pub fn resolve(overrides: LlmOverrides, platform: Platform) -> Self {
        let backend = overrides.backend.unwrap_or(Backend::Ollama);

        let (default_model, default_base, default_key) = match (backend, &platform) {
            (Backend::Ollama, _) => (
                "gemma3:4b-it-qat".to_string(),
                "http://localhost:11434/v1".to_string(),
                "ollama",
            ),
            (Backend::Lmstudio, Platform::MacOs) => (
                "mlx-community/gemma-3-4b-it-qat".to_string(),
                "http://localhost:1234/v1".to_string(),
                "lmstudio",
            ),
            (Backend::Lmstudio, Platform::Wsl) => (
                "gemma-3-4b-it-qat".to_string(),
                format!("http://{}:1234/v1", windows_host_ip()),
                "lmstudio",
            ),
            (Backend::Lmstudio, Platform::Other(_)) => (
                "gemma-3-4b-it-qat".to_string(),
                "http://localhost:1234/v1".to_string(),
                "lmstudio",
            ),
        };

        Self {
            backend,
            platform,
            model: overrides.model.unwrap_or(default_model),
            base_url: overrides.base_url.unwrap_or(default_base),
            api_key: overrides.api_key.unwrap_or_else(|| default_key.to_string()),
            temperature: overrides.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> Result<()> {
        validate_url("llm.base_url", &self.base_url)?;
        validate_non_empty_string("llm.model", &self.model)?;
        validate_range("llm.temperature", self.temperature, 0.0, 2.0)?;
        Ok(())
    }
}
