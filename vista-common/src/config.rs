//! Configuration file discovery and loading
//!
//! Config file resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`~/.config/vista/<file>` on Linux)
//! 4. System config directory (`/etc/vista/<file>`, Linux only)
//!
//! A missing config file is not an error: callers fall back to built-in
//! defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "vista";

/// Resolve which config file to read, if any
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(file_name)) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System-wide config (Linux only)
    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(file_name);
        if system.exists() {
            return Some(system);
        }
    }

    debug!("No {} config file found", file_name);
    None
}

/// Parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(toml::from_str(&content)?)
}

/// Parse a TOML file if one was resolved, otherwise return `T::default()`
///
/// A file that exists but fails to parse is still an error; only absence
/// falls back to defaults.
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) if path.exists() => load_toml(path),
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(T::default())
        }
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        value: u32,
    }

    #[test]
    #[serial]
    fn test_cli_arg_wins() {
        std::env::set_var("VISTA_TEST_CONFIG", "/tmp/from-env.toml");
        let path = resolve_config_path(
            Some(Path::new("/tmp/from-cli.toml")),
            "VISTA_TEST_CONFIG",
            "x.toml",
        );
        std::env::remove_var("VISTA_TEST_CONFIG");
        assert_eq!(path, Some(PathBuf::from("/tmp/from-cli.toml")));
    }

    #[test]
    #[serial]
    fn test_env_var_used_without_cli_arg() {
        std::env::set_var("VISTA_TEST_CONFIG", "/tmp/from-env.toml");
        let path = resolve_config_path(None, "VISTA_TEST_CONFIG", "x.toml");
        std::env::remove_var("VISTA_TEST_CONFIG");
        assert_eq!(path, Some(PathBuf::from("/tmp/from-env.toml")));
    }

    #[test]
    fn test_load_toml_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "value = 7").unwrap();
        let sample: Sample = load_toml(file.path()).unwrap();
        assert_eq!(sample, Sample { value: 7 });
    }

    #[test]
    fn test_load_toml_rejects_bad_syntax() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "value = [").unwrap();
        let result: Result<Sample> = load_toml(file.path());
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let sample: Sample =
            load_toml_or_default(Some(Path::new("/nonexistent/vista.toml"))).unwrap();
        assert_eq!(sample, Sample::default());
        let sample: Sample = load_toml_or_default(None).unwrap();
        assert_eq!(sample, Sample::default());
    }
}
