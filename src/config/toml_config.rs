use crate::utils::error::{QrError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

/// Process-wide settings, loaded once at startup and read-only afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen address. `":8080"` binds every interface.
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_max_encode_width")]
    pub max_encode_width: u32,
    #[serde(default = "default_encode_width")]
    pub default_encode_width: u32,
    /// KiB
    #[serde(default = "default_max_decode_file_size")]
    pub max_decode_file_size: usize,
    #[serde(default)]
    pub rtm_token: String,
    #[serde(default)]
    pub encode_api_endpoint: String,
    #[serde(default = "default_qrcode_size")]
    pub qrcode_size: u32,
    #[serde(default = "default_rtm_api_base")]
    pub rtm_api_base: String,
    #[serde(default = "default_open_api_base")]
    pub open_api_base: String,
}

fn default_port() -> String {
    ":8080".to_string()
}

fn default_max_encode_width() -> u32 {
    1024
}

fn default_encode_width() -> u32 {
    256
}

fn default_max_decode_file_size() -> usize {
    2048
}

fn default_qrcode_size() -> u32 {
    256
}

fn default_rtm_api_base() -> String {
    "https://rtm.bearychat.com".to_string()
}

fn default_open_api_base() -> String {
    "https://api.bearychat.com/v1".to_string()
}

impl fmt::Debug for AppConfig {
    /// `rtm_token` is redacted so the config can be logged.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.rtm_token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("debug", &self.debug)
            .field("max_encode_width", &self.max_encode_width)
            .field("default_encode_width", &self.default_encode_width)
            .field("max_decode_file_size", &self.max_decode_file_size)
            .field("rtm_token", &token)
            .field("encode_api_endpoint", &self.encode_api_endpoint)
            .field("qrcode_size", &self.qrcode_size)
            .field("rtm_api_base", &self.rtm_api_base)
            .field("open_api_base", &self.open_api_base)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            debug: false,
            max_encode_width: default_max_encode_width(),
            default_encode_width: default_encode_width(),
            max_decode_file_size: default_max_decode_file_size(),
            rtm_token: String::new(),
            encode_api_endpoint: String::new(),
            qrcode_size: default_qrcode_size(),
            rtm_api_base: default_rtm_api_base(),
            open_api_base: default_open_api_base(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| QrError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QrError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RTM_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QrError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Byte ceiling shared by `/decode` and bot attachment downloads.
    pub fn max_decode_bytes(&self) -> usize {
        self.max_decode_file_size.saturating_mul(1024)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = if self.port.starts_with(':') {
            format!("0.0.0.0{}", self.port)
        } else {
            self.port.clone()
        };

        addr.parse().map_err(|e| QrError::InvalidConfigValueError {
            field: "port".to_string(),
            value: self.port.clone(),
            reason: format!("not a listen address: {}", e),
        })
    }

    /// Extra checks for the chat bot, on top of [`Validate::validate`].
    pub fn validate_bot(&self) -> Result<()> {
        self.validate()?;
        validate_non_empty_string("rtm_token", &self.rtm_token)?;
        validate_url("encode_api_endpoint", &self.encode_api_endpoint)?;
        validate_url("rtm_api_base", &self.rtm_api_base)?;
        validate_url("open_api_base", &self.open_api_base)?;
        validate_range("qrcode_size", self.qrcode_size, 1, self.max_encode_width)?;
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        validate_positive_number("max_encode_width", self.max_encode_width as usize, 1)?;
        validate_range(
            "default_encode_width",
            self.default_encode_width,
            1,
            self.max_encode_width,
        )?;
        validate_positive_number("max_decode_file_size", self.max_decode_file_size, 1)?;
        Ok(())
    }
}
