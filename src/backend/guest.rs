use std::path::PathBuf;

use crate::config::SlateConfig;

/// The guest-mode flag, persisted as a marker file so a preview session
/// survives restarts the way the original browser-local flag did.
#[derive(Debug, Clone)]
pub struct GuestFlag {
    path: PathBuf,
}

impl GuestFlag {
    pub fn new() -> Self {
        Self::at(SlateConfig::guest_flag_path())
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    pub fn set(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, b"1")
    }

    /// Clearing an absent flag is a no-op.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to clear guest flag: {}", e);
            }
        }
    }
}

impl Default for GuestFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_flag() -> GuestFlag {
        let path = std::env::temp_dir()
            .join("slate-tests")
            .join(format!("guest-{}", uuid::Uuid::new_v4()));
        GuestFlag::at(path)
    }

    #[test]
    fn set_clear_roundtrip() {
        let flag = scratch_flag();
        assert!(!flag.is_set());
        flag.set().unwrap();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn clear_is_idempotent() {
        let flag = scratch_flag();
        flag.clear();
        flag.clear();
        assert!(!flag.is_set());
    }
}
