use std::path::{Path, PathBuf};

/// Returns the root shopdesk directory path.
///
/// Resolution order:
/// 1. `SHOPDESK_ROOT` environment variable (if set)
/// 2. Current working directory + `.shopdesk`
pub fn shopdesk_root() -> PathBuf {
    if let Ok(root) = std::env::var("SHOPDESK_ROOT") {
        PathBuf::from(root)
    } else {
        PathBuf::from(".shopdesk")
    }
}

/// Format a path relative to the shopdesk root for user-facing messages.
pub fn format_relative_path(path: &Path) -> String {
    path.strip_prefix(shopdesk_root())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
