// ⚙️ Config - Paths, Secrets, Log Level
// Environment overrides with sensible defaults; secrets degrade gracefully

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::warn;

/// CSV read when no path argument is given
pub const DEFAULT_DATA_FILE: &str = "transactions.csv";

/// Overrides the dashboard home directory
pub const HOME_ENV: &str = "FRAUD_DASHBOARD_HOME";

/// Selects the log level ("trace" .. "off"); defaults to info
pub const LOG_ENV: &str = "FRAUD_DASHBOARD_LOG";

const HOME_DIR_NAME: &str = ".fraud-dashboard";
const SECRETS_FILE: &str = "secrets.json";

// ============================================================================
// PATHS
// ============================================================================

/// First positional argument wins, otherwise the default file in the
/// current directory
pub fn resolve_data_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_DATA_FILE),
    }
}

/// `$FRAUD_DASHBOARD_HOME` when set, else `~/.fraud-dashboard`
pub fn dashboard_home() -> Option<PathBuf> {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    home::home_dir().map(|dir| dir.join(HOME_DIR_NAME))
}

// ============================================================================
// SECRETS
// ============================================================================

/// Optional tokens read from `secrets.json` in the dashboard home.
///
/// A missing or malformed file is never fatal: the dashboard runs with
/// defaults and the map falls back to its coarse rendering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub mapbox_token: Option<String>,
}

pub fn load_secrets() -> Secrets {
    let Some(path) = dashboard_home().map(|dir| dir.join(SECRETS_FILE)) else {
        return Secrets::default();
    };
    if !path.exists() {
        return Secrets::default();
    }

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("could not read {}: {}", path.display(), err);
            return Secrets::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(secrets) => secrets,
        Err(err) => {
            warn!("ignoring malformed {}: {}", path.display(), err);
            Secrets::default()
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

pub fn log_level() -> LevelFilter {
    env::var(LOG_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::INFO)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_data_path() {
        assert_eq!(
            resolve_data_path(None),
            PathBuf::from("transactions.csv")
        );
        assert_eq!(
            resolve_data_path(Some("data/frauds.csv")),
            PathBuf::from("data/frauds.csv")
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::WARN));
        assert_eq!(parse_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_secrets_deserialization() {
        let secrets: Secrets = serde_json::from_str(r#"{"mapbox_token": "pk.abc123"}"#).unwrap();
        assert_eq!(secrets.mapbox_token.as_deref(), Some("pk.abc123"));

        let empty: Secrets = serde_json::from_str("{}").unwrap();
        assert!(empty.mapbox_token.is_none());
    }

    // Everything touching FRAUD_DASHBOARD_HOME lives in one test so parallel
    // test threads never race on the variable.
    #[test]
    fn test_home_override_and_secrets_loading() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var(HOME_ENV, dir.path());

        assert_eq!(dashboard_home().unwrap(), dir.path().to_path_buf());

        // No secrets file yet: defaults, no error
        assert!(load_secrets().mapbox_token.is_none());

        let secrets_path = dir.path().join("secrets.json");
        let mut file = fs::File::create(&secrets_path).unwrap();
        writeln!(file, r#"{{"mapbox_token": "pk.test"}}"#).unwrap();
        drop(file);
        assert_eq!(load_secrets().mapbox_token.as_deref(), Some("pk.test"));

        // Malformed file degrades to defaults instead of failing
        fs::write(&secrets_path, "{ not json").unwrap();
        assert!(load_secrets().mapbox_token.is_none());

        env::remove_var(HOME_ENV);
    }
}
