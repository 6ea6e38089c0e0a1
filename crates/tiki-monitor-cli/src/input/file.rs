use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use tiki_monitor_core::config::DashboardConfig;

/// Read a YAML or JSON file (by extension) into a typed struct.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = canonical
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let value: T = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

/// Load and validate a dashboard configuration file.
pub fn read_config(path: &str) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let config: DashboardConfig = read_structured(path)?;
    config.validate()?;
    log::debug!("loaded configuration from {}", path);
    Ok(config)
}

/// Absolute path of a product CSV. Existence is left to the loader, whose
/// missing-file policy decides what an absent file means.
pub fn resolve_input(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let absolute = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if absolute.is_dir() {
        return Err(format!("Not a file: {}", absolute.display()).into());
    }
    Ok(absolute)
}

/// Resolve a path that must already exist.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let canonical = resolve_input(path)?;

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    Ok(canonical)
}
