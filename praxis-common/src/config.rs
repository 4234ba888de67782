//! Configuration loading and data directory resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_dir` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Database file path inside a resolved data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("praxis.db")
}

/// Get configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/praxis/config.toml first, then /etc/praxis/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("praxis").join("config.toml"));
        let system_config = PathBuf::from("/etc/praxis/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("praxis").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default data directory path
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/praxis (or /var/lib/praxis for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("praxis"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/praxis"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("praxis"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/praxis"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("praxis"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\praxis"))
    } else {
        PathBuf::from("./praxis_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let dir = resolve_data_dir(Some("/tmp/praxis-test"), "PRAXIS_TEST_UNSET_VAR").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/praxis-test"));
    }

    #[test]
    fn test_env_var_used_when_no_cli_arg() {
        std::env::set_var("PRAXIS_TEST_DATA_DIR_VAR", "/tmp/praxis-env");
        let dir = resolve_data_dir(None, "PRAXIS_TEST_DATA_DIR_VAR").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/praxis-env"));
        std::env::remove_var("PRAXIS_TEST_DATA_DIR_VAR");
    }

    #[test]
    fn test_database_path() {
        let path = database_path(std::path::Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data/praxis.db"));
    }
}
