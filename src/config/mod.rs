//! Configuration module

pub mod settings;

pub use settings::{
    BackendConfig, LimitsConfig, LoggingConfig, SamplerConfig, ServerConfig, Settings, StorageConfig,
};
