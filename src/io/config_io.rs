use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Directory that marks a checktree workspace
pub const WORKSPACE_DIR: &str = ".checktree";

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for workspace and config handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("not a checktree workspace: no {WORKSPACE_DIR}/ directory found (run `ct init`)")]
    NotAWorkspace,
    #[error("{0} already exists (use --force to overwrite the config)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {CONFIG_FILE}: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not serialize {CONFIG_FILE}: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Walk up from `start` looking for a `.checktree/` directory.
/// Returns the path of that directory.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(WORKSPACE_DIR);
        if dir.is_dir() {
            return Ok(dir);
        }
        if !current.pop() {
            return Err(ConfigError::NotAWorkspace);
        }
    }
}

/// Read `config.toml` from a workspace directory. A missing file means defaults.
pub fn read_config(workspace_dir: &Path) -> Result<Config, ConfigError> {
    let path = workspace_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Create `.checktree/` under `root` with a default config.
pub fn init_workspace(root: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let dir = root.join(WORKSPACE_DIR);
    if dir.join(CONFIG_FILE).exists() && !force {
        return Err(ConfigError::AlreadyInitialized(dir));
    }
    fs::create_dir_all(&dir)?;
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(dir.join(CONFIG_FILE), text)?;
    Ok(dir)
}
