//! CLI settings and the networks file
//!
//! Settings come from an optional `restake.toml` (or the file passed with
//! `--config`), overridden by `RESTAKE_` environment variables such as
//! `RESTAKE_CONNECT_TIMEOUT_MS` or `RESTAKE_DIRECTORY__TESTNET`.
//!
//! Networks live in a separate JSON or TOML file and keep their camelCase
//! keys.

use anyhow::Context;
use config::{Config, ConfigError, Environment, File};
use restake_core::NetworkConfig;
use restake_directory::DirectoryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the directory is reached
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySettings {
    /// Use testcosmos.directory for every network
    #[serde(default)]
    pub testnet: bool,

    /// Serve every directory endpoint from one base URL
    #[serde(default)]
    pub base_url: Option<String>,
}

impl DirectorySettings {
    pub fn directory_config(&self, testnet: bool) -> DirectoryConfig {
        match &self.base_url {
            Some(base) => DirectoryConfig::with_base(base),
            None => DirectoryConfig::for_network(testnet || self.testnet),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub directory: DirectorySettings,

    /// Query client construction timeout
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_networks_file")]
    pub networks_file: PathBuf,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_networks_file() -> PathBuf {
    PathBuf::from("networks.json")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directory: DirectorySettings::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            networks_file: default_networks_file(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from an optional `restake.toml` in the
    /// working directory, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("restake").required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn networks_path(&self) -> PathBuf {
        expand_path(&self.networks_file)
    }
}

/// `RESTAKE_` prefixed variables, `__` between nested keys
fn environment() -> Environment {
    Environment::with_prefix("RESTAKE")
        .prefix_separator("_")
        .separator("__")
}

#[derive(Deserialize)]
struct NetworksTable {
    #[serde(default)]
    networks: Vec<NetworkConfig>,
}

/// Read and validate a networks file.
///
/// JSON files hold an array of networks; TOML files a `[[networks]]` table.
pub fn load_networks(path: &Path) -> anyhow::Result<Vec<NetworkConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading networks file {}", path.display()))?;

    let networks: Vec<NetworkConfig> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str::<NetworksTable>(&content)?.networks,
        _ => serde_json::from_str(&content)?,
    };

    for network in &networks {
        network
            .validate()
            .with_context(|| format!("invalid network in {}", path.display()))?;
    }
    Ok(networks)
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.connect_timeout(), Duration::from_secs(10));
        assert_eq!(settings.networks_file, PathBuf::from("networks.json"));
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_load_settings_file() {
        let file = write_file(
            ".toml",
            r#"
connect_timeout_ms = 2500
networks_file = "/etc/restake/networks.json"

[directory]
base_url = "http://localhost:8080"

[logging]
json = true
"#,
        );

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.connect_timeout(), Duration::from_millis(2500));
        assert!(settings.logging.json);
        assert_eq!(
            settings.directory.directory_config(false).chains_url,
            "http://localhost:8080/chains"
        );
    }

    #[test]
    fn test_environment_overrides() {
        let vars = config::Map::from([
            ("RESTAKE_CONNECT_TIMEOUT_MS".to_string(), "1234".to_string()),
            ("RESTAKE_DIRECTORY__TESTNET".to_string(), "true".to_string()),
        ]);

        let settings = Settings::load_with(None, environment().source(Some(vars))).unwrap();

        assert_eq!(settings.connect_timeout(), Duration::from_millis(1234));
        assert!(settings.directory.testnet);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_file(".toml", "connect_timeout_ms = 2500\n");
        let vars = config::Map::from([(
            "RESTAKE_CONNECT_TIMEOUT_MS".to_string(),
            "700".to_string(),
        )]);

        let settings =
            Settings::load_with(Some(file.path()), environment().source(Some(vars))).unwrap();

        assert_eq!(settings.connect_timeout(), Duration::from_millis(700));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = Settings::load(Some(Path::new("/nonexistent/restake.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_directory_mode() {
        let settings = DirectorySettings::default();

        assert_eq!(
            settings.directory_config(true).rest_url,
            "https://rest.testcosmos.directory"
        );
        assert_eq!(
            settings.directory_config(false).rest_url,
            "https://rest.cosmos.directory"
        );
    }

    #[test]
    fn test_load_json_networks() {
        let file = write_file(
            ".json",
            r#"[
                {"name": "cosmoshub", "ownerAddress": "cosmosvaloper1eco", "gasPrice": "0.0025uatom"},
                {"name": "osmosis", "testnet": false}
            ]"#,
        );

        let networks = load_networks(file.path()).unwrap();

        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].owner_address.as_deref(), Some("cosmosvaloper1eco"));
    }

    #[test]
    fn test_load_toml_networks() {
        let file = write_file(
            ".toml",
            r#"
[[networks]]
name = "juno"
gasModifier = 1.3
allowOperators = ["junovaloper1a"]
"#,
        );

        let networks = load_networks(file.path()).unwrap();

        assert_eq!(networks[0].gas_modifier(), 1.3);
        assert_eq!(networks[0].allow_operators.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_invalid_network_rejected() {
        let file = write_file(".json", r#"[{"denom": "uatom"}]"#);

        assert!(load_networks(file.path()).is_err());
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_path(Path::new("~/networks.json"));

        if dirs::home_dir().is_some() {
            assert!(!expanded.starts_with("~"));
        }
        assert!(expanded.ends_with("networks.json"));
    }
}
