//! Reaper configuration.
//!
//! Built once at startup by layering defaults, an optional TOML file
//! named by `REAPER_CONFIG`, then environment variables. The result is
//! passed by reference into the sweep; nothing reads the environment
//! after that.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const ENV_CONFIG_PATH: &str = "REAPER_CONFIG";
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub const ENV_PROJECT_SCOPE: &str = "PROJECT_SCOPE";
pub const ENV_METADATA_KEY: &str = "SHUTDOWN_SECONDS_METADATA_KEY";
pub const ENV_REGION_LIST: &str = "REGION_LIST";
pub const ENV_REGION_MATCH: &str = "REGION_MATCH";
pub const ENV_TRANSPORT: &str = "NOTEBOOK_TRANSPORT";
pub const ENV_STOP_POLL_INTERVAL: &str = "STOP_POLL_INTERVAL_SECS";
pub const ENV_STOP_TIMEOUT: &str = "STOP_TIMEOUT_SECS";
pub const ENV_NOTEBOOKS_ENDPOINT: &str = "NOTEBOOKS_ENDPOINT";
pub const ENV_RESOURCE_MANAGER_ENDPOINT: &str = "RESOURCE_MANAGER_ENDPOINT";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Variables read verbatim into [`Settings`]; each lowercases to a field name.
/// `REGION_LIST` is comma-separated and merged separately.
const ENV_KEYS: &[&str] = &[
    ENV_PROJECT_ID,
    ENV_PROJECT_SCOPE,
    ENV_METADATA_KEY,
    ENV_REGION_MATCH,
    ENV_TRANSPORT,
    ENV_STOP_POLL_INTERVAL,
    ENV_STOP_TIMEOUT,
    ENV_NOTEBOOKS_ENDPOINT,
    ENV_RESOURCE_MANAGER_ENDPOINT,
    ENV_ACCESS_TOKEN,
];

pub const DEFAULT_PROJECT_ID: &str = "the-foo-bar";
pub const DEFAULT_METADATA_KEY: &str = "auto-shutdown-seconds";
pub const DEFAULT_REGION: &str = "us-central1";

/// Where the sweep gets its list of projects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectScope {
    /// Every ACTIVE project visible to the credentials.
    #[default]
    Search,
    /// Only the configured home project.
    Home,
}

impl ProjectScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Home => "home",
        }
    }
}

/// How a location id is matched against the region allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionMatch {
    /// The region must be a strict substring of the location
    /// (`us-central1-a` matches `us-central1`, `us-central1` does not).
    #[default]
    SubLocation,
    /// Plain substring containment.
    Substring,
}

impl RegionMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubLocation => "sub-location",
            Self::Substring => "substring",
        }
    }
}

/// Which Notebooks v1 client backs the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotebookTransport {
    /// Navigates responses as untyped JSON; a malformed instance entry
    /// is dropped on its own.
    Rest,
    /// Decodes each page into typed structs; a malformed page fails the
    /// whole listing.
    #[default]
    Client,
}

impl NotebookTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Client => "client",
        }
    }
}

/// Base URLs of the Google APIs the reaper talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub notebooks: String,
    pub resource_manager: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            notebooks: "https://notebooks.googleapis.com".to_string(),
            resource_manager: "https://cloudresourcemanager.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaperConfig {
    /// Home project; only swept when `project_scope` is `Home`.
    pub project_id: String,
    pub project_scope: ProjectScope,
    /// Metadata key holding an instance's idle threshold in seconds.
    pub shutdown_seconds_metadata_key: String,
    /// Region allow-list. Empty means every location is in scope.
    pub regions: Vec<String>,
    pub region_match: RegionMatch,
    pub transport: NotebookTransport,
    pub stop_poll_interval: Duration,
    pub stop_timeout: Duration,
    pub endpoints: Endpoints,
    /// Pre-minted bearer token; bypasses Application Default Credentials.
    pub access_token: Option<String>,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            project_scope: ProjectScope::default(),
            shutdown_seconds_metadata_key: DEFAULT_METADATA_KEY.to_string(),
            regions: vec![DEFAULT_REGION.to_string()],
            region_match: RegionMatch::default(),
            transport: NotebookTransport::default(),
            stop_poll_interval: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(600),
            endpoints: Endpoints::default(),
            access_token: None,
        }
    }
}

/// Flat shape shared by the TOML file and the environment.
///
/// Field names are the lowercased environment variable names, so the
/// file and the environment use one vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub project_id: String,
    pub project_scope: String,
    pub shutdown_seconds_metadata_key: String,
    pub regions: Vec<String>,
    pub region_match: String,
    pub notebook_transport: String,
    pub stop_poll_interval_secs: u64,
    pub stop_timeout_secs: u64,
    pub notebooks_endpoint: String,
    pub resource_manager_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_oauth_access_token: Option<String>,
}

impl From<&ReaperConfig> for Settings {
    fn from(config: &ReaperConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            project_scope: config.project_scope.as_str().to_string(),
            shutdown_seconds_metadata_key: config.shutdown_seconds_metadata_key.clone(),
            regions: config.regions.clone(),
            region_match: config.region_match.as_str().to_string(),
            notebook_transport: config.transport.as_str().to_string(),
            stop_poll_interval_secs: config.stop_poll_interval.as_secs(),
            stop_timeout_secs: config.stop_timeout.as_secs(),
            notebooks_endpoint: config.endpoints.notebooks.clone(),
            resource_manager_endpoint: config.endpoints.resource_manager.clone(),
            google_oauth_access_token: config.access_token.clone(),
        }
    }
}

impl TryFrom<Settings> for ReaperConfig {
    type Error = ConfigError;

    fn try_from(s: Settings) -> ConfigResult<Self> {
        Ok(Self {
            project_id: s.project_id,
            project_scope: s.project_scope.parse()?,
            shutdown_seconds_metadata_key: s.shutdown_seconds_metadata_key,
            regions: s.regions,
            region_match: s.region_match.parse()?,
            transport: s.notebook_transport.parse()?,
            stop_poll_interval: Duration::from_secs(s.stop_poll_interval_secs),
            stop_timeout: Duration::from_secs(s.stop_timeout_secs),
            endpoints: Endpoints {
                notebooks: s.notebooks_endpoint,
                resource_manager: s.resource_manager_endpoint,
            },
            access_token: s
                .google_oauth_access_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }
}

impl ReaperConfig {
    /// Assemble the configuration from defaults, the optional file named
    /// by `REAPER_CONFIG`, then the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::from(&Self::default())));

        if let Ok(path) = env::var(ENV_CONFIG_PATH)
            && !path.trim().is_empty()
        {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(ConfigError::MissingFile { path });
            }
            figment = figment.merge(Toml::file_exact(path));
        }

        figment = figment.merge(Env::raw().only(ENV_KEYS));
        if let Ok(raw) = env::var(ENV_REGION_LIST) {
            figment = figment.merge(Serialized::default("regions", parse_region_list(&raw)));
        }

        let settings: Settings = figment.extract()?;
        let config = Self::try_from(settings)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.shutdown_seconds_metadata_key.trim().is_empty() {
            return Err(ConfigError::invalid(
                ENV_METADATA_KEY,
                &self.shutdown_seconds_metadata_key,
                "metadata key must not be empty",
            ));
        }
        if self.project_scope == ProjectScope::Home && self.project_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                ENV_PROJECT_ID,
                &self.project_id,
                "home project scope needs a project id",
            ));
        }
        if self.stop_poll_interval.is_zero() {
            return Err(ConfigError::invalid(
                ENV_STOP_POLL_INTERVAL,
                "0",
                "poll interval must be positive",
            ));
        }
        if self.stop_timeout < self.stop_poll_interval {
            return Err(ConfigError::invalid(
                ENV_STOP_TIMEOUT,
                &self.stop_timeout.as_secs().to_string(),
                "stop timeout must be at least one poll interval",
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated region list, dropping blanks.
pub fn parse_region_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromStr for ProjectScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "home" => Ok(Self::Home),
            _ => Err(ConfigError::invalid(ENV_PROJECT_SCOPE, s, "expected `search` or `home`")),
        }
    }
}

impl FromStr for RegionMatch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sub-location" => Ok(Self::SubLocation),
            "substring" => Ok(Self::Substring),
            _ => Err(ConfigError::invalid(
                ENV_REGION_MATCH,
                s,
                "expected `sub-location` or `substring`",
            )),
        }
    }
}

impl FromStr for NotebookTransport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "client" => Ok(Self::Client),
            _ => Err(ConfigError::invalid(ENV_TRANSPORT, s, "expected `rest` or `client`")),
        }
    }
}
