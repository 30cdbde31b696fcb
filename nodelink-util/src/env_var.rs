use std::env;
use std::path::PathBuf;

/// Rune used when none is given on the command line or in the config file
pub const RUNE_VAR: &str = "NODELINK_RUNE";
/// Config file used when `--config` is not given
pub const CONFIG_VAR: &str = "NODELINK_CONFIG";
/// Directory for the log file
pub const LOG_DIR_VAR: &str = "NODELINK_LOG_DIR";
/// Set to `1` to skip TLS certificate verification
pub const NO_TLS_VERIFY_VAR: &str = "NODELINK_NO_TLS_VERIFY";

pub fn rune_from_env() -> Option<String> {
    non_empty_var(RUNE_VAR)
}

pub fn config_path_from_env() -> Option<PathBuf> {
    non_empty_var(CONFIG_VAR).map(PathBuf::from)
}

pub fn log_dir_from_env() -> Option<PathBuf> {
    non_empty_var(LOG_DIR_VAR).map(PathBuf::from)
}

pub fn tls_verify_disabled() -> bool {
    compare_env_var(NO_TLS_VERIFY_VAR, "1")
}

pub fn compare_env_var(key: &str, value: &str) -> bool {
    match env::var(key) {
        Ok(val) => val == value,
        Err(_) => false,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
