// Core modules
pub mod analysts;
pub mod backtest;
pub mod consensus;
pub mod error;
pub mod indicators;
pub mod learning;
pub mod models;
pub mod persistence;
pub mod settings;

// Re-export commonly used types
pub use consensus::ConsensusEngine;
pub use error::{EngineError, PersistenceError, SeriesError};
pub use models::*;
pub use settings::Settings;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
