// ── Runtime configuration ──
//
// Plain structs the controller and the HTTP data-service factory are
// built from. File/env loading lives in stashly-config.

use std::collections::HashMap;

use stashly_api::TransportConfig;
use url::Url;

/// Default optimism of the dispatcher's save commands.
///
/// An explicit `optimistic` argument on a command always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherOptions {
    pub optimistic_add: bool,
    pub optimistic_delete: bool,
    pub optimistic_update: bool,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            optimistic_add: false,
            optimistic_delete: true,
            optimistic_update: true,
        }
    }
}

/// Configuration for a [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dispatcher: DispatcherOptions,
    /// Capacity of the operation broadcast channel. Subscribers that fall
    /// further behind than this skip operations.
    pub action_channel_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherOptions::default(),
            action_channel_size: 256,
        }
    }
}

/// Paths of one entity type's resource, relative to the root URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    /// Single-entity path (`hero` → `{root}/hero/{key}`).
    pub entity: String,
    /// Collection path (`heroes` → `{root}/heroes/`).
    pub collection: String,
}

impl ResourcePaths {
    pub fn new(entity: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            collection: collection.into(),
        }
    }

    /// Both paths are the lowercased entity name; no pluralization.
    pub fn for_entity(entity_name: &str) -> Self {
        let path = entity_name.trim().to_lowercase();
        Self::new(path.clone(), path)
    }
}

/// Configuration for HTTP data services.
#[derive(Debug, Clone)]
pub struct DataServiceConfig {
    pub root_url: Url,
    pub transport: TransportConfig,
    /// Per-entity paths; missing entries fall back to
    /// [`ResourcePaths::for_entity`].
    pub resources: HashMap<String, ResourcePaths>,
}

impl DataServiceConfig {
    pub fn new(root_url: Url) -> Self {
        Self {
            root_url,
            transport: TransportConfig::default(),
            resources: HashMap::new(),
        }
    }

    pub fn with_resource(mut self, entity_name: impl Into<String>, paths: ResourcePaths) -> Self {
        self.resources.insert(entity_name.into(), paths);
        self
    }

    pub fn paths_for(&self, entity_name: &str) -> ResourcePaths {
        self.resources
            .get(entity_name)
            .cloned()
            .unwrap_or_else(|| ResourcePaths::for_entity(entity_name))
    }
}
