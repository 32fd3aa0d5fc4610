//! Persisted user id shared by all data commands

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_USER_ID: &str = "test_user_22";

const USER_ID_FILE: &str = "user_id";

/// File the user id is persisted to inside a state directory
pub fn user_id_path(state_dir: &Path) -> PathBuf {
    state_dir.join(USER_ID_FILE)
}

/// Read the stored user id, if any
pub fn stored_user_id(state_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(user_id_path(state_dir)).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Persist `user_id`, creating the state directory if needed
pub fn store_user_id(state_dir: &Path, user_id: &str) -> Result<()> {
    fs::create_dir_all(state_dir).context("Failed to create state directory")?;
    fs::write(user_id_path(state_dir), format!("{}\n", user_id)).context("Failed to write user id")?;
    log::info!("Persisted user id {} in {}", user_id, state_dir.display());
    Ok(())
}

/// Effective user id: explicit override, then stored value, then the default.
///
/// Whatever wins is written back so the next run picks it up.
pub fn persisted_user_id(explicit: Option<&str>, state_dir: &Path) -> Result<String> {
    let stored = stored_user_id(state_dir);
    let user_id = explicit
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| stored.clone())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    if stored.as_deref() != Some(user_id.as_str()) {
        store_user_id(state_dir, &user_id)?;
    }

    Ok(user_id)
}
