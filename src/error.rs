//! Error types for rotor-balance.
//!
//! The balance model itself never fails; these cover the outer surfaces
//! (terminal, configuration file, command line).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid mass specification '{0}': expected mass,radius,angle,position")]
    InvalidMassSpec(String),
}

pub type Result<T> = std::result::Result<T, Error>;
