use std::{env, fs};
use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILENAME: &str = "settings.json";
const SETTINGS_ENV_VAR: &str = "TODO_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrioritySeed {
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    pub database_path: String,
    pub static_dir: String,
    pub session_secret: String,
    pub session_expiration_in_minutes: u32,
    pub default_timezone: String,
    #[serde(default)]
    pub priorities: Vec<PrioritySeed>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Settings {
    /// Reads `settings.json` from the working directory, or the file named
    /// by `TODO_SETTINGS` when set.
    pub fn load() -> Result<Settings, SettingsError> {
        let path = env::var(SETTINGS_ENV_VAR).unwrap_or_else(|_| SETTINGS_FILENAME.to_string());
        let content = fs::read_to_string(&path)
            .map_err(|source| SettingsError::Read { path: path.clone(), source })?;
        Settings::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Settings, SettingsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.tcp_socket_binding, self.tcp_socket_port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tcp_socket_binding: "127.0.0.1".to_string(),
            tcp_socket_port: 8080,
            database_path: "todo.redb".to_string(),
            static_dir: "static".to_string(),
            session_secret: "development-secret".to_string(),
            session_expiration_in_minutes: 120,
            default_timezone: "Europe/Moscow".to_string(),
            priorities: vec![
                PrioritySeed { name: "urgent".to_string(), position: 1 },
                PrioritySeed { name: "normal".to_string(), position: 2 },
            ],
            categories: ["Work", "Home", "Study", "Shopping"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bundled_settings_file() {
        let settings = Settings::from_json(include_str!("../../../settings.json")).unwrap();
        assert_eq!(settings.tcp_socket_port, 8080);
        assert_eq!(settings.default_timezone, "Europe/Moscow");
        assert_eq!(settings.priorities.len(), 2);
        assert!(settings.categories.contains(&"Work".to_string()));
    }

    #[test]
    fn seeds_are_optional() {
        let settings = Settings::from_json(r#"{
            "tcp_socket_binding": "127.0.0.1",
            "tcp_socket_port": 3000,
            "database_path": "x.redb",
            "static_dir": "static",
            "session_secret": "s",
            "session_expiration_in_minutes": 5,
            "default_timezone": "UTC"
        }"#).unwrap();
        assert!(settings.priorities.is_empty());
        assert!(settings.categories.is_empty());
        assert_eq!(settings.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Settings::from_json("{"), Err(SettingsError::Parse(_))));
    }
}
