// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the obstacle feedback pipeline
//!
//! None of these are fatal: the session logs them and keeps processing frames.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for sensor sources
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type alias for output ports
pub type PortResult<T> = Result<T, PortError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Sensor source errors
    Sensor(SensorError),
    /// Output port errors
    Port(PortError),
    /// Configuration errors
    Config(ConfigError),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Sensor source errors
#[derive(Debug, Clone)]
pub enum SensorError {
    /// Source could not be opened
    Unavailable(String),
    /// Session was interrupted by the sensor subsystem
    Interrupted,
    /// Frame dimensions do not match its data
    InvalidFrame(String),
    /// A recording line could not be parsed
    Parse { line: usize, message: String },
    /// Underlying I/O failure
    Io(String),
}

/// Output port errors
#[derive(Debug, Clone)]
pub enum PortError {
    /// Device or service missing
    Unavailable(String),
    /// Device is still busy with a previous request
    Busy,
    /// Write to the device failed
    Io(String),
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// File could not be read or written
    Io(String),
    /// File is not valid JSON for the config schema
    Parse(String),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Sensor(e) => write!(f, "Sensor error: {}", e),
            AppError::Port(e) => write!(f, "Output error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable(msg) => write!(f, "Sensor unavailable: {}", msg),
            SensorError::Interrupted => write!(f, "Sensor session interrupted"),
            SensorError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            SensorError::Parse { line, message } => {
                write!(f, "Recording line {}: {}", line, message)
            }
            SensorError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::Unavailable(msg) => write!(f, "Output unavailable: {}", msg),
            PortError::Busy => write!(f, "Output is busy"),
            PortError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SensorError {}
impl std::error::Error for PortError {}
impl std::error::Error for ConfigError {}

impl From<SensorError> for AppError {
    fn from(err: SensorError) -> Self {
        AppError::Sensor(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::Io(err.to_string())
    }
}

impl From<std::io::Error> for PortError {
    fn from(err: std::io::Error) -> Self {
        PortError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
