//! Path management for MendozaContas
//!
//! ## Path Resolution Order
//!
//! 1. `MENDOZA_CONTAS_DATA_DIR` environment variable (if set)
//! 2. The platform config directory reported by `directories`
//!    (e.g. `~/.config/mendoza-contas` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::ContasError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "MENDOZA_CONTAS_DATA_DIR";

/// Manages all paths used by MendozaContas
#[derive(Debug, Clone)]
pub struct ContasPaths {
    /// Base directory for all MendozaContas data
    base_dir: PathBuf,
}

impl ContasPaths {
    /// Create a new ContasPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, ContasError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create ContasPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn movements_file(&self) -> PathBuf {
        self.data_dir().join("movements.json")
    }

    pub fn cards_file(&self) -> PathBuf {
        self.data_dir().join("cards.json")
    }

    pub fn charges_file(&self) -> PathBuf {
        self.data_dir().join("charges.json")
    }

    pub fn businesses_file(&self) -> PathBuf {
        self.data_dir().join("businesses.json")
    }

    pub fn transfers_file(&self) -> PathBuf {
        self.data_dir().join("transfers.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), ContasError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ContasError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| ContasError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if MendozaContas has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, ContasError> {
    ProjectDirs::from("", "", "mendoza-contas")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ContasError::Config("Could not determine a config directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(!paths.is_initialized());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.charges_file(),
            temp_dir.path().join("data").join("charges.json")
        );
        assert_eq!(paths.audit_log(), temp_dir.path().join("audit.log"));
    }
}
