//! Resolves where task profiles and the warp asset live.
//!
//! Search order for a profile `<name>.toml`:
//!
//! 1. `$MARBLETASK_CONFIG_DIR`
//! 2. `./config`
//! 3. the platform config directory (e.g. `~/.config/marbletask`)
//!
//! The first directory holding the file wins. When none does, the path in the
//! highest-priority directory is reported so the diagnostic names a real
//! location.

use std::env;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "MARBLETASK_CONFIG_DIR";
pub const WARP_ASSET: &str = "perspective.data";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "marbletask";
const APPLICATION: &str = "marbletask";
const LOCAL_CONFIG_DIR: &str = "config";

#[derive(Debug, Clone)]
pub struct AppPaths {
    roots: Vec<PathBuf>,
}

impl AppPaths {
    pub fn discover() -> Self {
        let mut roots = Vec::with_capacity(3);
        if let Some(dir) = env_override(ENV_CONFIG_DIR) {
            roots.push(dir);
        }
        roots.push(PathBuf::from(LOCAL_CONFIG_DIR));
        if let Some(dirs) = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION) {
            roots.push(dirs.config_dir().to_path_buf());
        }
        Self { roots }
    }

    #[cfg(test)]
    pub fn from_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory new files are written to: the first root that exists, or the
    /// first root when none does yet.
    pub fn config_dir(&self) -> &Path {
        self.roots
            .iter()
            .find(|root| root.is_dir())
            .or_else(|| self.roots.first())
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(LOCAL_CONFIG_DIR))
    }

    /// Locates `file_name` along the search path.
    pub fn find(&self, file_name: &str) -> PathBuf {
        self.roots
            .iter()
            .map(|root| root.join(file_name))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| self.config_dir().join(file_name))
    }

    pub fn profile(&self, name: &str) -> PathBuf {
        self.find(&format!("{name}.toml"))
    }

    pub fn warp_asset(&self) -> PathBuf {
        self.find(WARP_ASSET)
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_comes_first() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let paths = AppPaths::discover();
        assert_eq!(paths.roots()[0], root.path());
        assert_eq!(paths.roots()[1], Path::new("config"));
        assert_eq!(paths.config_dir(), root.path());
    }

    #[test]
    fn earlier_root_wins_when_both_hold_the_profile() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("demo.toml"), "").unwrap();
        fs::write(second.path().join("demo.toml"), "").unwrap();
        fs::write(second.path().join("pilot.toml"), "").unwrap();

        let paths = AppPaths::from_roots(vec![first.path().into(), second.path().into()]);
        assert_eq!(paths.profile("demo"), first.path().join("demo.toml"));
        assert_eq!(paths.profile("pilot"), second.path().join("pilot.toml"));
    }

    #[test]
    fn missing_file_points_at_first_existing_root() {
        let existing = TempDir::new().unwrap();
        let absent = existing.path().join("absent");
        let paths = AppPaths::from_roots(vec![absent, existing.path().into()]);
        assert_eq!(paths.config_dir(), existing.path());
        assert_eq!(paths.warp_asset(), existing.path().join(WARP_ASSET));
    }
}
