//! Configuration module for MendozaContas
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::ContasPaths;
pub use settings::Settings;
