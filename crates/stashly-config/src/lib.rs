//! Configuration for the stashly tools.
//!
//! A TOML file with a `[server]` section, dispatcher defaults, and one
//! `[entities.<Name>]` table per entity type, layered under `STASHLY_`
//! environment overrides. Translates into `stashly_core` runtime types:
//! [`CacheConfig`], an [`EntityDefinitionService`], and an
//! [`EntityDataService`] backed by REST.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stashly_api::{TlsMode, TransportConfig};
use stashly_core::{
    CacheConfig, CoreError, DataServiceConfig, DispatcherOptions, EntityDataService,
    EntityDefinitionService, EntityMetadata, HttpDataServiceFactory, ResourcePaths,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,

    #[serde(default)]
    pub dispatcher: Dispatcher,

    /// Entity types keyed by name (`[entities.Hero]`).
    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
}

/// The REST server the data services talk to.
#[derive(Debug, Deserialize, Serialize)]
pub struct Server {
    /// Root URL the resource paths are joined onto.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_url() -> String {
    "http://localhost:3000/api".into()
}
fn default_timeout() -> u64 {
    30
}

/// Default optimism of save commands.
#[derive(Debug, Deserialize, Serialize)]
pub struct Dispatcher {
    #[serde(default)]
    pub optimistic_add: bool,

    #[serde(default = "default_true")]
    pub optimistic_delete: bool,

    #[serde(default = "default_true")]
    pub optimistic_update: bool,

    /// Capacity of the operation broadcast channel.
    #[serde(default = "default_channel_size")]
    pub action_channel_size: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            optimistic_add: false,
            optimistic_delete: true,
            optimistic_update: true,
            action_channel_size: default_channel_size(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_channel_size() -> usize {
    256
}

/// One entity type.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    /// Single-entity path (defaults to the lowercased name).
    pub entity_path: Option<String>,

    /// Collection path (defaults to the lowercased name).
    pub collection_path: Option<String>,

    /// Key field (defaults to `id`).
    pub id_field: Option<String>,

    /// Field to keep the collection sorted by.
    pub sort_field: Option<String>,

    /// String properties the filter pattern is matched against.
    #[serde(default)]
    pub filter_props: Vec<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "stashly", "stashly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stashly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered sources: defaults, then the TOML file, then `STASHLY_` env vars.
///
/// Nested keys are separated by a double underscore, so
/// `STASHLY_SERVER__URL` sets `server.url` and
/// `STASHLY_DISPATCHER__OPTIMISTIC_ADD` sets `dispatcher.optimistic_add`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STASHLY_").split("__"))
}

/// Load the full Config from the canonical file + environment. A missing
/// file is not an error.
pub fn load_config() -> Result<Config, ConfigError> {
    let config: Config = figment(&config_path()).extract()?;
    Ok(config)
}

/// Load from an explicit file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Translation to core config ──────────────────────────────────────

impl Config {
    /// Controller configuration: dispatcher defaults and channel size.
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            dispatcher: DispatcherOptions {
                optimistic_add: self.dispatcher.optimistic_add,
                optimistic_delete: self.dispatcher.optimistic_delete,
                optimistic_update: self.dispatcher.optimistic_update,
            },
            action_channel_size: self.dispatcher.action_channel_size,
        }
    }

    /// One entity definition per `[entities.<Name>]` table.
    pub fn to_definitions(&self) -> Result<EntityDefinitionService, ConfigError> {
        let mut definitions = EntityDefinitionService::new();
        for (name, entity) in &self.entities {
            definitions.register_metadata(entity_metadata(name, entity)?);
        }
        Ok(definitions)
    }

    /// Root URL, transport settings and per-entity resource paths.
    pub fn to_data_service_config(&self) -> Result<DataServiceConfig, ConfigError> {
        let root_url: url::Url = self.server.url.parse().map_err(|_| ConfigError::Validation {
            field: "server.url".into(),
            reason: format!("invalid URL: {}", self.server.url),
        })?;

        let tls = if self.server.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.server.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        let mut config = DataServiceConfig::new(root_url);
        config.transport = TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(Duration::from_secs(self.server.timeout));

        for (name, entity) in &self.entities {
            let fallback = ResourcePaths::for_entity(name);
            let paths = ResourcePaths::new(
                entity.entity_path.clone().unwrap_or(fallback.entity),
                entity.collection_path.clone().unwrap_or(fallback.collection),
            );
            config = config.with_resource(name.trim(), paths);
        }
        Ok(config)
    }

    /// Data-service registry that creates a REST service per entity type
    /// on first use.
    pub fn to_data_services(&self) -> Result<EntityDataService, ConfigError> {
        let factory = HttpDataServiceFactory::new(self.to_data_service_config()?)?;
        Ok(EntityDataService::with_factory(Arc::new(factory)))
    }
}

fn entity_metadata(name: &str, entity: &EntityConfig) -> Result<EntityMetadata, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "entities".into(),
            reason: "entity name must not be blank".into(),
        });
    }

    let mut metadata = EntityMetadata::new(name);
    if let Some(ref field) = entity.id_field {
        if field.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("entities.{name}.id_field"),
                reason: "must not be blank".into(),
            });
        }
        metadata = metadata.with_id_field(field.trim());
    }
    if let Some(ref field) = entity.sort_field {
        metadata = metadata.sort_by(field.trim());
    }
    if !entity.filter_props.is_empty() {
        metadata = metadata.filter_props(entity.filter_props.iter().map(String::as_str));
    }
    Ok(metadata)
}
