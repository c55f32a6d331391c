//! Integration tests for config file discovery
//!
//! Tests the resolution order:
//! - Command-line argument beats everything
//! - Environment variable is next, unless empty
//! - Per-user config directory is used only when the file exists
//!
//! Note: Uses serial_test because these tests mutate process environment
//! variables (VISTA_IT_CONFIG, XDG_CONFIG_HOME).

use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use vista_common::config::{load_toml_or_default, resolve_config_path, CONFIG_DIR_NAME};

const ENV_VAR: &str = "VISTA_IT_CONFIG";
const FILE_NAME: &str = "vista-it.toml";

#[derive(Debug, Default, serde::Deserialize, PartialEq)]
struct Settings {
    #[serde(default)]
    level: String,
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(ENV_VAR, "");
    let path = resolve_config_path(None, ENV_VAR, FILE_NAME);
    env::remove_var(ENV_VAR);

    // Nothing else exists for this file name
    assert_eq!(path, None);
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_user_config_dir_used_when_file_exists() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(CONFIG_DIR_NAME);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(FILE_NAME), "level = \"debug\"\n").unwrap();

    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", home.path());
    env::remove_var(ENV_VAR);
    let path = resolve_config_path(None, ENV_VAR, FILE_NAME);
    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(path, Some(dir.join(FILE_NAME)));
    let settings: Settings = load_toml_or_default(path.as_deref()).unwrap();
    assert_eq!(settings.level, "debug");
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var_even_if_missing() {
    env::set_var(ENV_VAR, "/tmp/vista-it-env.toml");
    let path = resolve_config_path(
        Some(Path::new("/nonexistent/vista-it-cli.toml")),
        ENV_VAR,
        FILE_NAME,
    );
    env::remove_var(ENV_VAR);

    assert_eq!(path, Some(PathBuf::from("/nonexistent/vista-it-cli.toml")));

    // An explicit but missing file still degrades to defaults
    let settings: Settings = load_toml_or_default(path.as_deref()).unwrap();
    assert_eq!(settings, Settings::default());
}
