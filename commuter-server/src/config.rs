//! Server configuration from environment variables.
//!
//! | Variable               | Default                 |
//! |------------------------|-------------------------|
//! | `DIGITRAFFIC_URL`      | public GraphQL endpoint |
//! | `DIGITRAFFIC_USER`     | `commuter-server`       |
//! | `BIND_ADDR`            | `127.0.0.1:3000`        |
//! | `FAVORITES_DIR`        | `data/favorites`        |
//! | `EXCLUDED_STATIONS`    | none (comma-separated)  |
//! | `REQUEST_TIMEOUT_SECS` | `10`                    |
//! | `FIXTURE_DIR`          | unset (live API)        |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::digitraffic::DigitrafficConfig;

const DEFAULT_USER: &str = "commuter-server";
const DEFAULT_FAVORITES_DIR: &str = "data/favorites";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Everything `main` needs to assemble the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Overrides the client's default endpoint when set
    pub digitraffic_url: Option<String>,
    pub digitraffic_user: String,
    pub bind_addr: SocketAddr,
    /// Holds `records/` and the key-value file
    pub favorites_dir: PathBuf,
    pub excluded_stations: Vec<String>,
    pub request_timeout_secs: u64,
    /// Serve saved responses from here instead of calling the API
    pub fixture_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            digitraffic_url: None,
            digitraffic_user: DEFAULT_USER.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            favorites_dir: PathBuf::from(DEFAULT_FAVORITES_DIR),
            excluded_stations: Vec::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            fixture_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "BIND_ADDR",
                value,
            })?,
            None => defaults.bind_addr,
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "REQUEST_TIMEOUT_SECS",
                        value,
                    });
                }
            },
            None => defaults.request_timeout_secs,
        };

        let excluded_stations = get("EXCLUDED_STATIONS")
            .map(|list| {
                list.split(',')
                    .map(|code| code.trim().to_uppercase())
                    .filter(|code| !code.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            digitraffic_url: get("DIGITRAFFIC_URL"),
            digitraffic_user: get("DIGITRAFFIC_USER").unwrap_or(defaults.digitraffic_user),
            bind_addr,
            favorites_dir: get("FAVORITES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.favorites_dir),
            excluded_stations,
            request_timeout_secs,
            fixture_dir: get("FIXTURE_DIR").map(PathBuf::from),
        })
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_favorites_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.favorites_dir = dir.into();
        self
    }

    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = Some(dir.into());
        self
    }

    /// Client settings derived from this config.
    pub fn digitraffic(&self) -> DigitrafficConfig {
        let config = DigitrafficConfig::new(&self.digitraffic_user)
            .with_timeout(self.request_timeout_secs)
            .with_excluded_stations(self.excluded_stations.clone());
        match &self.digitraffic_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }

    /// Directory of the structured favorites tier.
    pub fn records_dir(&self) -> PathBuf {
        self.favorites_dir.join("records")
    }

    /// File of the key-value favorites tier.
    pub fn kv_file(&self) -> PathBuf {
        self.favorites_dir.join("favorites.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.records_dir(), PathBuf::from("data/favorites/records"));
        assert_eq!(config.kv_file(), PathBuf::from("data/favorites/favorites.json"));
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DIGITRAFFIC_URL", "http://localhost:9999/graphql"),
            ("DIGITRAFFIC_USER", "tester/1.0"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("FAVORITES_DIR", "/var/lib/commuter"),
            ("EXCLUDED_STATIONS", "hkh, , LNÄ"),
            ("REQUEST_TIMEOUT_SECS", "3"),
            ("FIXTURE_DIR", "fixtures"),
        ]))
        .unwrap();

        assert_eq!(config.digitraffic_url.as_deref(), Some("http://localhost:9999/graphql"));
        assert_eq!(config.digitraffic_user, "tester/1.0");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.favorites_dir, PathBuf::from("/var/lib/commuter"));
        assert_eq!(config.excluded_stations, vec!["HKH", "LNÄ"]);
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.fixture_dir, Some(PathBuf::from("fixtures")));

        let client = config.digitraffic();
        assert_eq!(client.base_url, "http://localhost:9999/graphql");
        assert_eq!(client.user, "tester/1.0");
        assert_eq!(client.timeout_secs, 3);
        assert_eq!(client.excluded_stations, vec!["HKH", "LNÄ"]);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let vars = [("DIGITRAFFIC_USER", "  "), ("BIND_ADDR", "")];
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.digitraffic_user, DEFAULT_USER);
        assert_eq!(config.bind_addr, AppConfig::default().bind_addr);
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("BIND_ADDR", "localhost")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "BIND_ADDR",
                value: "localhost".into()
            }
        );

        assert!(AppConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "ten")])).is_err());
    }

    #[test]
    fn builders_override() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let config = AppConfig::default()
            .with_bind_addr(addr)
            .with_favorites_dir("/tmp/favs")
            .with_fixture_dir("/tmp/fixtures");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.records_dir(), PathBuf::from("/tmp/favs/records"));
        assert!(config.fixture_dir.is_some());
    }
}
