use anyhow::{Context, Result};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::constants::CONFIG_FILE_NAME;

/// Searches for `esmify.json` from the working directory upwards.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    let current_dir = env::current_dir()?;
    Ok(find_config_file_from(&current_dir))
}

pub fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    debug!("Searching for {}", CONFIG_FILE_NAME);
    let mut current_dir = start.to_path_buf();
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let candidate = current_dir.join(CONFIG_FILE_NAME);
        trace!("Checking for config at: {:?}", candidate);
        if candidate.is_file() {
            debug!("Found config file at: {:?}", candidate);
            return Some(candidate);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("No {} in any parent folder", CONFIG_FILE_NAME);
                return None;
            }
        }
    }
}

pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading config from {:?}", path);
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
}
