//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listen port override.
pub const ENV_PORT: &str = "PORT";
pub const ENV_API_UPSTREAM: &str = "GATEWAY_API_UPSTREAM";
pub const ENV_APP_UPSTREAM: &str = "GATEWAY_APP_UPSTREAM";
pub const ENV_SITE_UPSTREAM: &str = "GATEWAY_SITE_UPSTREAM";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment, then validation.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a TOML document. Missing sections fall back to defaults.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment variables on `config`.
///
/// `PORT` replaces only the port of the bind address.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_PORT) {
        let port: u16 = value.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            value: value.clone(),
        })?;
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }

    let upstreams = &mut config.upstreams;
    for (var, slot) in [
        (ENV_API_UPSTREAM, &mut upstreams.api),
        (ENV_APP_UPSTREAM, &mut upstreams.app),
        (ENV_SITE_UPSTREAM, &mut upstreams.site),
    ] {
        if let Some(value) = lookup(var) {
            *slot = value;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstreams.api, "http://127.0.0.1:8001");
        assert_eq!(config.routing.app_prefix, "/app");
        assert!(config.proxy.change_origin);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [upstreams]
            api = "http://10.0.0.5:8001"

            [routing]
            asset_prefixes = ["/assets"]

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstreams.api, "http://10.0.0.5:8001");
        assert_eq!(config.upstreams.site, "http://127.0.0.1:9000");
        assert_eq!(config.routing.asset_prefixes, vec!["/assets".to_string()]);
        assert_eq!(config.routing.api_prefix, "/api/");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Some(Path::new("/nonexistent/unified-gateway.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn port_override_keeps_host() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "127.0.0.1:8080".into();
        apply_env_overrides(&mut config, env(&[("PORT", "9999")])).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn upstream_overrides() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("GATEWAY_APP_UPSTREAM", "http://frontend:3000"),
                ("GATEWAY_SITE_UPSTREAM", "http://website:9000"),
            ]),
        )
        .unwrap();
        assert_eq!(config.upstreams.api, "http://127.0.0.1:8001");
        assert_eq!(config.upstreams.app, "http://frontend:3000");
        assert_eq!(config.upstreams.site, "http://website:9000");
    }
}
