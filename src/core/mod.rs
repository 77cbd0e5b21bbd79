// Core business logic module

pub mod config;
pub mod gpu_monitor;

// Re-export commonly used items
pub use config::{DisplayConfig, EngineConfig};
