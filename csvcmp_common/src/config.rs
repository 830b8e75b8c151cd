use crate::{CompareConfig, CsvCmpError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "csvcmp.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CompareConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// Load configuration from the portable location if present, otherwise
/// from the platform config directory.
pub fn load_config() -> Result<LoadedConfig, CsvCmpError> {
    load_config_from(&resolve_config_path()?)
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<LoadedConfig, CsvCmpError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| CsvCmpError::Serialization(e.to_string()))?
    } else {
        CompareConfig::default()
    };

    validate_config(&config)?;

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
    })
}

pub fn validate_config(config: &CompareConfig) -> Result<(), CsvCmpError> {
    if !config.tolerance.is_finite() || config.tolerance < 0.0 {
        return Err(CsvCmpError::Config(format!(
            "tolerance must be a non-negative finite number, got {}",
            config.tolerance
        )));
    }
    if config.delimiter.is_empty() {
        return Err(CsvCmpError::Config("delimiter must not be empty".to_string()));
    }
    Ok(())
}

fn resolve_config_path() -> Result<PathBuf, CsvCmpError> {
    if let Some(portable_path) = portable_config_path() {
        if portable_path.exists() {
            return Ok(portable_path);
        }
    }

    let dirs = ProjectDirs::from("", "", "csvcmp")
        .ok_or_else(|| CsvCmpError::Config("Unable to determine config directory".to_string()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
