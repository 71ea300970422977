use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ident::{IdScheme, DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "REQREG_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG: &str = "reqreg.yaml";

/// Config file looked up in the home directory
pub const HOME_CONFIG: &str = ".reqreg.yaml";

/// Tool settings; every field falls back to its default when omitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifier prefix, e.g. `REQ` for `REQ-12`
    pub prefix: String,
    /// Document file extension
    pub extension: String,
    /// Register file name inside a project directory
    pub readme: String,
    /// Directory scanned for projects when none is given
    pub req_root: PathBuf,
    /// Marker of quarantine keys used during renames
    pub quarantine_marker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            extension: "md".to_string(),
            readme: "README.md".to_string(),
            req_root: PathBuf::from("requirements"),
            quarantine_marker: DEFAULT_QUARANTINE_MARKER.to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config named by `explicit`, or the first one found by
    /// [`find_config_path`], or the defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            return Self::load(path);
        }

        match find_config_path() {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Identifier scheme built from `prefix` and `quarantine_marker`
    pub fn scheme(&self) -> Result<IdScheme> {
        IdScheme::new(&self.prefix, &self.quarantine_marker)
            .with_context(|| format!("Invalid identifier settings in config (prefix {:?})", self.prefix))
    }

    /// Register path of the project at `dir`
    pub fn readme_for(&self, dir: &Path) -> PathBuf {
        dir.join(&self.readme)
    }
}

/// Gets the path of the implicit config file, if any.
///
/// `REQREG_CONFIG` wins even when the file does not exist, so a bad value is
/// reported rather than ignored.
pub fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }

    let home = dirs::home_dir()?.join(HOME_CONFIG);
    home.exists().then_some(home)
}
