//! CLI-side config resolution: file, environment, then flag overrides.

use std::sync::Arc;

use stashly_config::Config;
use stashly_core::{Controller, EntityCollectionInterceptor, TracingInterceptor};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file (explicit path or platform default) and apply the
/// `--url`, `--insecure` and `--timeout` overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = match global.config {
        Some(ref path) => stashly_config::load_config_from(path)?,
        None => stashly_config::load_config()?,
    };

    if let Some(ref url) = global.url {
        cfg.server.url.clone_from(url);
    }
    if global.insecure {
        cfg.server.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.server.timeout = timeout;
    }
    Ok(cfg)
}

/// Build a controller for `cfg`. An entity type the file does not describe
/// is registered with default settings (`id` key, lowercased paths).
pub fn build_controller(mut cfg: Config, entity: Option<&str>) -> Result<Controller, CliError> {
    if let Some(name) = entity {
        cfg.entities.entry(name.trim().to_owned()).or_default();
    }

    let definitions = Arc::new(cfg.to_definitions()?);
    let data_services = Arc::new(cfg.to_data_services()?);
    let interceptors: Vec<Arc<dyn EntityCollectionInterceptor>> = vec![Arc::new(TracingInterceptor)];

    Ok(Controller::new(
        cfg.to_cache_config(),
        definitions,
        data_services,
        interceptors,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_entity_is_registered() {
        let controller = build_controller(Config::default(), Some("Hero")).unwrap();
        assert!(controller.definitions().contains("Hero"));
        assert!(!controller.definitions().contains("Villain"));
    }

    #[test]
    fn blank_entity_name_is_rejected() {
        let err = build_controller(Config::default(), Some("  ")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
