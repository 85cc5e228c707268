//! Configuration management for the dotsOCR gateway

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default body limit for parse uploads (200 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root under which scratch workspaces are created (OS temp dir if unset)
    pub temp_root: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

/// Connection parameters handed to the external layout engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    pub ip: String,
    pub port: u16,
    pub dpi: u32,
    pub min_pixels: u64,
    pub max_pixels: u64,
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8001,
            },
            upload: UploadConfig {
                temp_root: None,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            engine: EngineConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: "python3".to_string(),
            args: vec!["dots_ocr/parser.py".to_string()],
            ip: "localhost".to_string(),
            port: 8000,
            dpi: 200,
            min_pixels: 3136,
            max_pixels: 11_289_600,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "GATEWAY_PORT", defaults.server.port)?,
            },
            upload: UploadConfig {
                temp_root: lookup("GATEWAY_TEMP_DIR")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from),
                max_upload_bytes: parse_var(
                    &lookup,
                    "GATEWAY_MAX_UPLOAD_BYTES",
                    defaults.upload.max_upload_bytes,
                )?,
            },
            engine: EngineConfig {
                program: lookup("DOTS_PROGRAM").unwrap_or(defaults.engine.program),
                args: lookup("DOTS_ARGS")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or(defaults.engine.args),
                ip: lookup("DOTS_IP").unwrap_or(defaults.engine.ip),
                port: parse_var(&lookup, "DOTS_PORT", defaults.engine.port)?,
                dpi: parse_var(&lookup, "DOTS_DPI", defaults.engine.dpi)?,
                min_pixels: parse_var(&lookup, "DOTS_MIN_PIXELS", defaults.engine.min_pixels)?,
                max_pixels: parse_var(&lookup, "DOTS_MAX_PIXELS", defaults.engine.max_pixels)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
    }
}
