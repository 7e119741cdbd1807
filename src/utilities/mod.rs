//! Shared utilities: configuration, errors, logging and storage paths.

pub mod config;
pub mod errors;
pub mod logger;
pub mod paths;

pub use config::FleetConfig;
pub use errors::StoreError;
pub use logger::{FleetLogger, LogFacade, LogLevel, RecordingLogger};
