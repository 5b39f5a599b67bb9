//! Resolved CLI settings: file locations plus the client configuration.

use std::env;
use std::path::{Path, PathBuf};

use voca_core::config::{parse_config, RemoteConfig, VocaConfig};

use crate::error::CliError;

const APP_DIR_NAME: &str = "voca";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "voca.db";
const GROUPS_FILE_NAME: &str = "groups.json";

/// Everything a command needs to open the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliSettings {
    pub db_path: PathBuf,
    pub groups_path: PathBuf,
    pub config: VocaConfig,
}

impl CliSettings {
    /// Resolve settings from flags, environment and the config file, in that
    /// order of precedence.
    pub fn resolve(
        db_path: Option<PathBuf>,
        groups_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config_path = config_path
            .or_else(|| env::var_os("VOCA_CONFIG").map(PathBuf::from))
            .unwrap_or_else(default_config_path);
        let config = load_config(&config_path)?;
        let config = apply_remote_overrides(
            config,
            env::var("VOCA_REMOTE_URL").ok(),
            env::var("VOCA_REMOTE_TOKEN").ok(),
        );

        Ok(Self {
            db_path: db_path
                .or_else(|| env::var_os("VOCA_DB_PATH").map(PathBuf::from))
                .unwrap_or_else(|| default_data_dir().join(DB_FILE_NAME)),
            groups_path: groups_path
                .or_else(|| env::var_os("VOCA_GROUPS_PATH").map(PathBuf::from))
                .unwrap_or_else(|| default_data_dir().join(GROUPS_FILE_NAME)),
            config,
        })
    }
}

/// Read the config file; a missing file means defaults.
pub fn load_config(path: &Path) -> Result<VocaConfig, CliError> {
    if !path.exists() {
        return Ok(VocaConfig::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|error| {
        CliError::Config(format!("Failed to read config at {}: {error}", path.display()))
    })?;
    parse_config(&raw).map_err(|error| {
        CliError::Config(format!("Failed to parse config at {}: {error}", path.display()))
    })
}

/// Environment values replace the file's remote endpoint field by field.
pub fn apply_remote_overrides(
    mut config: VocaConfig,
    base_url: Option<String>,
    auth_token: Option<String>,
) -> VocaConfig {
    let base_url = voca_core::util::normalize_text_option(base_url).or(config.remote.base_url);
    let auth_token =
        voca_core::util::normalize_text_option(auth_token).or(config.remote.auth_token);
    config.remote = RemoteConfig::new(base_url, auth_token);
    config
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR_NAME))
        .join(CONFIG_FILE_NAME)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use voca_core::config::RemotePropagation;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, VocaConfig::default());
    }

    #[test]
    fn config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"remote":{"base_url":"https://voca.example.com/"},"propagation":"write_through"}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.remote.base_url.as_deref(),
            Some("https://voca.example.com")
        );
        assert_eq!(config.propagation, RemotePropagation::WriteThrough);
    }

    #[test]
    fn malformed_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let error = load_config(&path).unwrap_err().to_string();
        assert!(error.contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn environment_overrides_remote_fields() {
        let config = VocaConfig {
            remote: RemoteConfig::new(Some("https://file.example.com".into()), None),
            ..VocaConfig::default()
        };

        let merged = apply_remote_overrides(config, None, Some(" token ".into()));
        assert_eq!(
            merged.remote.base_url.as_deref(),
            Some("https://file.example.com")
        );
        assert_eq!(merged.remote.auth_token.as_deref(), Some("token"));
        assert!(merged.remote.is_configured());

        let merged = apply_remote_overrides(merged, Some("https://env.example.com/".into()), None);
        assert_eq!(
            merged.remote.base_url.as_deref(),
            Some("https://env.example.com")
        );
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let merged = apply_remote_overrides(VocaConfig::default(), Some("  ".into()), Some(String::new()));
        assert!(!merged.remote.is_configured());
    }
}
