use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VestryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub parish_name: String,
    #[serde(default)]
    pub session_user_id: Option<i64>,
    #[serde(default)]
    pub session_user_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            parish_name: String::new(),
            session_user_id: None,
            session_user_name: None,
        }
    }
}

/// The acting user for audit-trailed operations. Loaded from the settings
/// file after `vestry login`, never from ambient global state.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: i64,
}

impl Session {
    pub fn require() -> Result<Self> {
        match load_settings().session_user_id {
            Some(user_id) => Ok(Session { user_id }),
            None => Err(VestryError::Settings(
                "not logged in; run `vestry login <email>` first".to_string(),
            )),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("vestry")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("vestry")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| VestryError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn db_path() -> PathBuf {
    get_data_dir().join("vestry.db")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            parish_name: "Paróquia São José".to_string(),
            session_user_id: Some(2),
            session_user_name: Some("Tesoureiro".to_string()),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.parish_name, "Paróquia São José");
        assert_eq!(loaded.session_user_id, Some(2));
    }

    #[test]
    fn test_defaults_have_no_session() {
        let s = Settings::default();
        assert!(s.session_user_id.is_none());
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/test");
        assert!(s.session_user_id.is_none());
        assert!(s.parish_name.is_empty());
    }
}
