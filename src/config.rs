// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Runtime configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file) is valid. A handful of `DESCRAMBLE_*` environment variables
//! override the file after loading.

use std::path::Path;

use serde::Deserialize;

use crate::codec::{ImageRsCodec, OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::pipeline::Limits;

/// Errors while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub command: CommandConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
    pub limits: Limits,
    pub forward: ForwardConfig,
    pub notices: Notices,
}

/// Command word and aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub name: String,
    pub aliases: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            name: "解混淆".to_string(),
            aliases: vec!["解密图片".to_string(), "deconfuse".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub force_plain_http: bool,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            force_plain_http: true,
            timeout_secs: 30,
        }
    }
}

/// Sender shown on the forwarded result message.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    pub sender_nickname: String,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            sender_nickname: "318891403".to_string(),
        }
    }
}

/// User-facing reply texts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Notices {
    pub no_image: String,
    pub no_url: String,
    pub download_failed: String,
    pub all_failed: String,
    pub generic_error: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            no_image: "请发送带有混淆图片的消息或回复一条带有图片的消息".to_string(),
            no_url: "无法获取图片URL".to_string(),
            download_failed: "图片下载失败".to_string(),
            all_failed: "所有图片解混淆处理失败，请检查图片格式是否正确".to_string(),
            generic_error: "处理图片时发生错误".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&text)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DESCRAMBLE_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("DESCRAMBLE_JPEG_QUALITY") {
            self.output.jpeg_quality = parse_env("DESCRAMBLE_JPEG_QUALITY", &v)?;
        }
        if let Some(v) = lookup("DESCRAMBLE_FORCE_PLAIN_HTTP") {
            self.fetch.force_plain_http = match v.as_str() {
                "1" | "true" | "True" | "on" | "ON" => true,
                "0" | "false" | "False" | "off" | "OFF" => false,
                _ => return Err(ConfigError::InvalidEnv { name: "DESCRAMBLE_FORCE_PLAIN_HTTP", value: v }),
            };
        }
        if let Some(v) = lookup("DESCRAMBLE_FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_env("DESCRAMBLE_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DESCRAMBLE_MAX_PIXELS") {
            self.limits.max_pixels = parse_env("DESCRAMBLE_MAX_PIXELS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Invalid("output.jpeg_quality must be within 1..=100"));
        }
        if self.limits.max_dimension == 0 || self.limits.max_pixels == 0 {
            return Err(ConfigError::Invalid("limits must be non-zero"));
        }
        if self.command.name.trim().is_empty() {
            return Err(ConfigError::Invalid("command.name must not be empty"));
        }
        Ok(())
    }

    /// Codec matching the `[output]` section.
    pub fn codec(&self) -> ImageRsCodec {
        match self.output.format {
            OutputFormat::Jpeg => ImageRsCodec::jpeg(self.output.jpeg_quality),
            OutputFormat::Png => ImageRsCodec::png(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}
