//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Fits a 4096x4096 RGBA PNG plus an RGBA mask of the same size after base64
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_true")]
    pub cors_allow_any_origin: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Artifact directories
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("./input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// Input bounds and output encoding
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Longest accepted side of a normalized input image
    #[serde(default = "default_max_side")]
    pub max_side: u32,
    /// Optional downscale applied after validation
    #[serde(default)]
    pub working_max_side: Option<u32>,
    #[serde(default = "default_fixed_jpeg_quality")]
    pub fixed_jpeg_quality: u8,
    #[serde(default = "default_result_jpeg_quality")]
    pub result_jpeg_quality: u8,
}

fn default_max_side() -> u32 {
    4096
}

fn default_fixed_jpeg_quality() -> u8 {
    100
}

fn default_result_jpeg_quality() -> u8 {
    95
}

/// Inference worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_name")]
    pub name: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// Sampler parameters forwarded verbatim to the worker
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplerConfig {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg")]
    pub cfg: f32,
    #[serde(default = "default_grow_mask_by")]
    pub grow_mask_by: u32,
    #[serde(default = "default_denoise")]
    pub denoise: f32,
    #[serde(default = "default_sampler_max_side")]
    pub max_side: u32,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default = "default_negative_prompt")]
    pub default_negative_prompt: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            cfg: default_cfg(),
            grow_mask_by: default_grow_mask_by(),
            denoise: default_denoise(),
            max_side: default_sampler_max_side(),
            seed: None,
            default_negative_prompt: default_negative_prompt(),
        }
    }
}

fn default_backend_name() -> String {
    "comfy-inpaint".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8188".to_string()
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

fn default_timeout() -> u64 {
    600_000
}

fn default_steps() -> u32 {
    20
}

fn default_cfg() -> f32 {
    8.0
}

fn default_grow_mask_by() -> u32 {
    6
}

fn default_denoise() -> f32 {
    1.0
}

fn default_sampler_max_side() -> u32 {
    1024
}

fn default_negative_prompt() -> String {
    "blur, low quality, distortion, ugly, bad anatomy, text, watermark".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("storage.input_dir", "./input")?
            .set_default("storage.output_dir", "./output")?
            .set_default("limits.max_side", default_max_side() as i64)?
            .set_default("backend.name", default_backend_name())?
            .set_default("backend.endpoint", default_endpoint())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (prefixed with INPAINT_GATEWAY_)
            .add_source(
                Environment::with_prefix("INPAINT_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.backend.endpoint.trim().is_empty() {
            return Err(invalid(format!("Backend '{}' must have an endpoint", self.backend.name)));
        }

        if self.limits.max_side == 0 {
            return Err(invalid("limits.max_side must be positive"));
        }

        if let Some(working) = self.limits.working_max_side {
            if working == 0 || working > self.limits.max_side {
                return Err(invalid(format!(
                    "limits.working_max_side must be in 1..={}, got {}",
                    self.limits.max_side, working
                )));
            }
        }

        for (name, quality) in [
            ("fixed_jpeg_quality", self.limits.fixed_jpeg_quality),
            ("result_jpeg_quality", self.limits.result_jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(invalid(format!("limits.{} must be in 1..=100, got {}", name, quality)));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                max_body_bytes: default_max_body_bytes(),
                cors_allow_any_origin: true,
            },
            storage: StorageConfig {
                input_dir: default_input_dir(),
                output_dir: default_output_dir(),
            },
            limits: LimitsConfig {
                max_side: default_max_side(),
                working_max_side: None,
                fixed_jpeg_quality: default_fixed_jpeg_quality(),
                result_jpeg_quality: default_result_jpeg_quality(),
            },
            backend: BackendConfig {
                name: default_backend_name(),
                endpoint: default_endpoint(),
                health_check_path: default_health_check_path(),
                timeout_ms: default_timeout(),
                sampler: SamplerConfig::default(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}
