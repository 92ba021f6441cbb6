mod config;
mod config_merge;
pub mod paths;

pub use config::{DEBUG_ENV, InitConfig, LogConfig, MnemoConfig, StorageConfig};
