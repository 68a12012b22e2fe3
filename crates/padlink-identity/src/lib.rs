//! Identity resolution across the input APIs: a registry that correlates
//! the devices every API reports, looks up their mappings and resolves
//! captured input codes to semantic controls.

mod config;
mod console;
mod correlation;
mod descriptor;
mod registry;
mod resolve;

use thiserror::Error;

pub use config::{default_config_path, load_config, parse_config, resolve_config, Settings};
pub use console::{console_code, ConsoleCode};
pub use correlation::{assign_console_slots, find_correlated, CorrelationKey, SlotAssignment};
pub use descriptor::ControllerDescriptor;
pub use registry::DeviceRegistry;
pub use resolve::{resolve_binding, MatchKind, Resolution};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid sdl version: {0}")]
    InvalidVersion(String),
    #[error("environment variable {0} is not set")]
    EnvVarNotSet(String),
    #[error("config file {0} not found")]
    NotFound(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
