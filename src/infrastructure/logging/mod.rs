//! Logging infrastructure.
//!
//! Structured logging via `tracing`/`tracing-subscriber`: JSON or pretty
//! formatting, optional file output with rotation, and secret scrubbing.

mod config;
mod logger;
mod rotation;
mod secret_scrubbing;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
pub use rotation::LogRotator;
pub use secret_scrubbing::SecretScrubbingLayer;
