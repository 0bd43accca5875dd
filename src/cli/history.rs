//! # History File Management
//!
//! Resolves where the REPL history lives. The `TINYSQL_HISTORY` environment
//! variable takes precedence over the default of `~/.tinysql_history`, and
//! setting it to an empty string disables persistence entirely. rustyline
//! handles the actual file I/O.

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_HISTORY_FILE: &str = ".tinysql_history";
const HISTORY_ENV_VAR: &str = "TINYSQL_HISTORY";

/// The history file to load and save, or `None` when persistence is
/// disabled (blank override) or no home directory is known.
pub fn history_path() -> Option<PathBuf> {
    match env::var(HISTORY_ENV_VAR) {
        Ok(overridden) if overridden.is_empty() => None,
        Ok(overridden) => Some(PathBuf::from(overridden)),
        Err(_) => {
            let home = env::var("HOME").ok().filter(|h| !h.is_empty())?;
            Some(Path::new(&home).join(DEFAULT_HISTORY_FILE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_and_blank_disables() {
        env::set_var(HISTORY_ENV_VAR, "/tmp/custom-history");
        assert_eq!(history_path(), Some(PathBuf::from("/tmp/custom-history")));

        env::set_var(HISTORY_ENV_VAR, "");
        assert_eq!(history_path(), None);

        env::remove_var(HISTORY_ENV_VAR);
    }

    #[test]
    fn falls_back_to_a_file_under_home() {
        env::remove_var(HISTORY_ENV_VAR);

        if let Some(path) = history_path() {
            assert!(path.ends_with(DEFAULT_HISTORY_FILE));
        }
    }
}
