//! Storage initialization
//!
//! Handles first-run setup: directories, empty ledger files, and the
//! settings file holding the local user's id.

use crate::config::paths::ContasPaths;
use crate::config::settings::Settings;
use crate::error::ContasResult;

use super::Storage;

/// Initialize storage for a fresh installation
///
/// Existing settings (and therefore the user id) are kept, so running it
/// twice is harmless.
pub fn initialize_storage(paths: &ContasPaths) -> ContasResult<Settings> {
    paths.ensure_directories()?;

    let mut settings = Settings::load_or_create(paths)?;

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;
    storage.save_all()?;

    if !settings.setup_completed {
        settings.setup_completed = true;
        settings.save(paths)?;
        tracing::info!(user = %settings.user_id, "initialized data directory");
    }

    Ok(settings)
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &ContasPaths) -> bool {
    !paths.is_initialized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert!(needs_initialization(&paths));

        let settings = initialize_storage(&paths).unwrap();

        assert!(!needs_initialization(&paths));
        assert!(settings.setup_completed);
        assert!(paths.movements_file().exists());
        assert!(paths.transfers_file().exists());
    }

    #[test]
    fn test_reinitialize_keeps_user() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());

        let first = initialize_storage(&paths).unwrap();
        let second = initialize_storage(&paths).unwrap();
        assert_eq!(first.user_id, second.user_id);
    }
}
