//! Handles the configuration of the daemon and the provisioning tool.
//!
//! this module is responsible for parsing the Songbook.toml file, applying environment variable and cli overrides,
//! and selecting which environment's connection parameters to use.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use std::{collections::HashMap, path::PathBuf, str::FromStr, time::Duration};

use songbook_storage::db::{ConnectOptions, crud::StoreOptions, filter::QueryOptions};

pub static DEFAULT_CONFIG: &str = include_str!("../Songbook.toml");

/// The environment variable selecting an environment when `--env` isn't given.
pub const ENVIRONMENT_VARIABLE: &str = "SONGBOOK_ENV";
/// The environment used when nothing selects one.
pub const DEFAULT_ENVIRONMENT: &str = "runtime";

/// The settings as they appear in the config file, before an environment is selected.
#[derive(Clone, Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    daemon: DaemonSettings,
    #[serde(default)]
    query: QueryOptions,
    #[serde(default)]
    environments: HashMap<String, EnvironmentSettings>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// General Daemon Settings
    pub daemon: DaemonSettings,
    /// Default semantics of list filters.
    pub query: QueryOptions,
    /// Name of the selected environment.
    pub environment_name: String,
    /// Connection parameters of the selected environment.
    pub environment: EnvironmentSettings,
}

impl Settings {
    /// Load settings from the config file, environment variables, and CLI arguments.
    ///
    /// The environment variables are prefixed with `SONGBOOK_`, nested keys are separated by `__`
    /// (e.g. `SONGBOOK_DAEMON__PORT=8080`).
    ///
    /// # Arguments
    ///
    /// * `config` - path to the config file.
    /// * `environment` - which `[environments.*]` block to use, falls back to `SONGBOOK_ENV`, then to `runtime`.
    /// * `port`, `log_level` - overrides for the `[daemon]` section.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file is not found or is invalid,
    /// or if the selected environment isn't defined in it.
    #[inline]
    pub fn init(
        config: PathBuf,
        environment: Option<String>,
        port: Option<u16>,
        log_level: Option<log::LevelFilter>,
    ) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(config))
            .add_source(
                Environment::with_prefix("SONGBOOK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let file: ConfigFile = s.try_deserialize()?;

        let environment_name = environment
            .or_else(|| std::env::var(ENVIRONMENT_VARIABLE).ok())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        Self::from_file(file, environment_name, port, log_level)
    }

    fn from_file(
        mut file: ConfigFile,
        environment_name: String,
        port: Option<u16>,
        log_level: Option<log::LevelFilter>,
    ) -> Result<Self, ConfigError> {
        let Some(mut environment) = file.environments.remove(&environment_name) else {
            let mut known = file.environments.keys().cloned().collect::<Vec<_>>();
            known.sort();
            return Err(ConfigError::Message(format!(
                "unknown environment \"{environment_name}\", the config file defines: [{}]",
                known.join(", ")
            )));
        };

        environment.endpoint = expand_endpoint(&environment.endpoint);

        if let Some(port) = port {
            file.daemon.port = port;
        }

        if let Some(log_level) = log_level {
            file.daemon.log_level = log_level;
        }

        Ok(Self {
            daemon: file.daemon,
            query: file.query,
            environment_name,
            environment,
        })
    }

    /// Where and how the storage layer should connect.
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            endpoint: self.environment.endpoint.clone(),
            namespace: self.environment.namespace.clone(),
            database: self.environment.database.clone(),
            connect_timeout: Duration::from_millis(self.environment.connect_timeout_ms),
        }
    }

    #[must_use]
    pub const fn store_options(&self) -> StoreOptions {
        StoreOptions {
            request_timeout: Duration::from_millis(self.environment.request_timeout_ms),
            query: self.query,
        }
    }

    /// Get the (default) path to the config file.
    /// If the config file does not exist at this path, it will be created with the default config.
    ///
    /// See [`crate::get_config_dir`] for more information about where this default path is located.
    ///
    /// # Errors
    ///
    /// This function will return an error if the system config directory (e.g., `~/.config` on linux) could not be found, or if the config file was missing and could not be created.
    #[inline]
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        match crate::get_config_dir() {
            Ok(config_dir) => {
                // if the config directory does not exist, create it
                if !config_dir.exists() {
                    std::fs::create_dir_all(&config_dir)?;
                }
                let config_file = config_dir.join("Songbook.toml");

                if !config_file.exists() {
                    std::fs::write(&config_file, DEFAULT_CONFIG)?;
                }

                Ok(config_file)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Unable to find the config directory for songbook.",
                ))
            }
        }
    }
}

/// Expand a leading `~` in the path part of an engine url, e.g. `surrealkv://~/db`.
fn expand_endpoint(endpoint: &str) -> String {
    match endpoint.split_once("://") {
        Some((scheme, path)) => format!("{scheme}://{}", shellexpand::tilde(path)),
        None => shellexpand::tilde(endpoint).into_owned(),
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DaemonSettings {
    /// The port the HTTP API listens on.
    /// Default is 5000.
    #[serde(default = "default_port")]
    pub port: u16,
    /// What level of logging to use.
    /// Default is "info".
    #[serde(default = "default_log_level")]
    #[serde(deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

const fn default_port() -> u16 {
    5000
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

impl Default for DaemonSettings {
    #[inline]
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

/// Connection parameters of one environment (e.g. runtime or test).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct EnvironmentSettings {
    pub endpoint: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_namespace() -> String {
    "songbook".into()
}

fn default_database() -> String {
    "songs".into()
}

const fn default_timeout_ms() -> u64 {
    5000
}
