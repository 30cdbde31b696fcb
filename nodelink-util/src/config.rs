use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use serde::Deserialize;

/// Default REST port of a CLN node
pub const DEFAULT_PORT: u16 = 3010;

/// Defaults read from a TOML file, all optional.
///
/// ```toml
/// host = "https://node.local"
/// port = 3010
/// rune_file = "/home/user/.lightning/rune"
/// tls_verify = false
/// log_level = "debug"
/// log_dir = "/var/log/nodelink"
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub rune: Option<String>,
    pub rune_file: Option<PathBuf>,
    pub tls_verify: Option<bool>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Read a rune from a file, ignoring surrounding whitespace
pub fn read_rune_file(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading rune file {}", path.display()))?;
    let rune = contents.trim();
    if rune.is_empty() {
        bail!("rune file {} is empty", path.display());
    }
    Ok(rune.to_string())
}

/// Pick the rune from the given sources.
///
/// An explicit rune and a rune file are mutually exclusive; with neither, the
/// fallback (usually from the environment) is used.
pub fn get_rune(
    rune: Option<String>,
    rune_file: Option<PathBuf>,
    fallback: Option<String>,
) -> Result<String> {
    match (rune, rune_file) {
        (Some(_), Some(_)) => bail!("give either a rune or a rune file, not both"),
        (Some(rune), None) => Ok(rune),
        (None, Some(path)) => read_rune_file(&path),
        (None, None) => fallback.ok_or_else(|| anyhow!("a rune or a rune file must be set")),
    }
}
