//! Loading, defaulting, and reloading the configuration file.

use std::path::Path;

use packrunner_core::{SimError, SimResult};

use crate::config::Config;
use crate::validation;

/// Loads `path`; if missing, writes out the defaults and returns them
/// (§6: "Missing file: defaults written out and used"). Validation errors
/// aggregate and fail the load.
pub fn load(path: &Path) -> SimResult<Config> {
    let config = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| SimError::config(format!("failed to parse {}: {e}", path.display())))?
    } else {
        let defaults = Config::default();
        save(path, &defaults)?;
        defaults
    };

    validation::validate(&config).map_err(|errors| {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        SimError::config(format!("configuration invalid: {joined}"))
    })?;

    Ok(config)
}

pub fn save(path: &Path, config: &Config) -> SimResult<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| SimError::config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Re-reads `path` and returns the new config along with the top-level
/// section names that changed, for the `CONFIG_CHANGED` event payload.
pub fn reload(path: &Path, previous: &Config) -> SimResult<(Config, Vec<&'static str>)> {
    let next = load(path)?;
    let changed = previous.changed_sections(&next);
    Ok((next, changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("packrunner-config-test-{}-{}", std::process::id(), name));
        p
    }

    #[test]
    fn test_missing_file_writes_and_returns_defaults() {
        let path = temp_path("missing.json");
        let _ = fs::remove_file(&path);
        let config = load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_config_fails_load() {
        let path = temp_path("invalid.json");
        fs::write(&path, r#"{"timing": {"target_fps": 0, "tick_interval": 0.016, "simulation_speed": 1.0, "max_delta_time": 0.25}}"#).unwrap();
        assert!(load(&path).is_err());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reload_reports_changed_sections() {
        let path = temp_path("reload.json");
        let _ = fs::remove_file(&path);
        let original = load(&path).unwrap();

        let mut edited = original.clone();
        edited.orders.generation_interval = 45.0;
        save(&path, &edited).unwrap();

        let (reloaded, changed) = reload(&path, &original).unwrap();
        assert_eq!(reloaded.orders.generation_interval, 45.0);
        assert_eq!(changed, vec!["orders"]);
        fs::remove_file(&path).unwrap();
    }
}
