//! Hand a shortcut's target to the OS default opener

use std::path::PathBuf;

use crate::error::CoreError;
use crate::Result;

/// Trim whitespace, one pair of surrounding quotes and trailing separators
pub fn clean_launch_path(raw: &str) -> String {
    let mut path = raw.trim();

    for quote in ['"', '\''] {
        if path.len() >= 2 && path.starts_with(quote) && path.ends_with(quote) {
            path = path[1..path.len() - 1].trim();
            break;
        }
    }

    path.trim_end_matches(['/', '\\']).to_string()
}

pub fn launch(raw: &str) -> Result<PathBuf> {
    let cleaned = clean_launch_path(raw);
    if cleaned.is_empty() {
        return Err(CoreError::Validation("launch path must not be empty".to_string()));
    }

    let path = PathBuf::from(&cleaned);
    if !path.exists() {
        return Err(CoreError::NotFound(cleaned));
    }

    open::that_detached(&path).map_err(|e| CoreError::Launch {
        path: cleaned.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), "Launched application");
    Ok(path)
}
