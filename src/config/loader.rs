//! Configuration loading from an optional TOML file and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backends::BackendService;
use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Placeholder some templating tools leave behind for unset values.
const NO_VALUE: &str = "<no value>";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable(s) not set: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment, layered over `path` when given.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Load configuration using `lookup` as the environment.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => GatewayConfig::default(),
    };

    let env = Env(lookup);
    apply_env(&mut config, &env)?;

    let missing: Vec<&'static str> = BackendService::ALL
        .into_iter()
        .filter(|service| config.backends.address(*service).is_none())
        .map(BackendService::env_var)
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Returns the variable if it holds a usable value.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| is_set(v))
    }

    /// First usable value among `keys`.
    fn first(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }
}

fn is_set(value: &str) -> bool {
    !value.is_empty() && value != NO_VALUE
}

fn apply_env<F>(config: &mut GatewayConfig, env: &Env<F>) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = env.get("PORT") {
        config.listener.port = port.parse().map_err(|e| ConfigError::Invalid {
            var: "PORT",
            reason: format!("{e}"),
        })?;
    }
    if let Some(addr) = env.get("LISTEN_ADDR") {
        config.listener.listen_addr = addr;
    }
    if let Some(dir) = env.get("STATIC_DIR") {
        config.listener.static_dir = PathBuf::from(dir);
    }

    for service in BackendService::ALL {
        if let Some(addr) = env.get(service.env_var()) {
            config.backends.set_address(service, addr);
        }
    }

    if env.get("DISABLE_TRACING").is_some() {
        config.telemetry.disable_tracing = true;
    }
    if let Some(key) = env.first(&["TELEMETRY_API_KEY", "NEW_RELIC_API_KEY"]) {
        config.telemetry.api_key = Some(key);
    }
    if let Some(url) = env.first(&["TELEMETRY_METRIC_URL", "NEW_RELIC_METRIC_URL"]) {
        config.telemetry.metric_url = Some(url);
    }
    if let Some(url) = env.first(&["TELEMETRY_TRACE_URL", "NEW_RELIC_TRACE_URL"]) {
        config.telemetry.trace_url = Some(url);
    }

    if let Some(level) = env.get("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.logging.format = format
            .parse()
            .map_err(|reason| ConfigError::Invalid { var: "LOG_FORMAT", reason })?;
    }

    // Placeholders in a file layer count as unset too.
    let telemetry = &mut config.telemetry;
    for value in [&mut telemetry.api_key, &mut telemetry.metric_url, &mut telemetry.trace_url] {
        if value.as_deref().is_some_and(|v| !is_set(v)) {
            *value = None;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        BackendService::ALL
            .into_iter()
            .enumerate()
            .map(|(i, s)| (s.env_var(), format!("localhost:{}", 7000 + i)))
            .collect()
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<GatewayConfig, ConfigError> {
        load_with(None, |k| env.get(k).cloned())
    }

    #[test]
    fn loads_defaults_when_backends_present() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.bind_host(), "0.0.0.0");
        assert_eq!(
            config.backends.address(BackendService::Cart),
            Some("localhost:7002")
        );
        assert!(!config.telemetry.disable_tracing);
        assert!(config.telemetry.api_key.is_none());
    }

    #[test]
    fn each_missing_backend_is_reported() {
        for service in BackendService::ALL {
            let mut env = full_env();
            env.remove(service.env_var());
            match load(&env) {
                Err(ConfigError::Missing(vars)) => assert_eq!(vars, vec![service.env_var()]),
                other => panic!("expected missing {}, got {:?}", service.env_var(), other),
            }
        }
    }

    #[test]
    fn empty_backend_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("AD_SERVICE_ADDR", String::new());
        assert!(matches!(load(&env), Err(ConfigError::Missing(v)) if v == vec!["AD_SERVICE_ADDR"]));
    }

    #[test]
    fn port_and_listen_addr_override() {
        let mut env = full_env();
        env.insert("PORT", "9000".into());
        env.insert("LISTEN_ADDR", "127.0.0.1".into());
        let config = load(&env).unwrap();
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.bind_host(), "127.0.0.1");
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut env = full_env();
        env.insert("PORT", "eighty".into());
        assert!(matches!(load(&env), Err(ConfigError::Invalid { var: "PORT", .. })));
    }

    #[test]
    fn telemetry_settings_use_fallback_names_and_skip_placeholders() {
        let mut env = full_env();
        env.insert("NEW_RELIC_API_KEY", "secret".into());
        env.insert("TELEMETRY_METRIC_URL", NO_VALUE.into());
        env.insert("NEW_RELIC_TRACE_URL", "https://traces.example.com/v1/traces".into());
        let config = load(&env).unwrap();
        assert_eq!(config.telemetry.api_key.as_deref(), Some("secret"));
        assert!(config.telemetry.metric_url.is_none());
        assert_eq!(
            config.telemetry.trace_url.as_deref(),
            Some("https://traces.example.com/v1/traces")
        );
        assert!(!format!("{:?}", config.telemetry).contains("secret"));
    }

    #[test]
    fn disable_tracing_accepts_any_value() {
        let mut env = full_env();
        env.insert("DISABLE_TRACING", "1".into());
        assert!(load(&env).unwrap().telemetry.disable_tracing);
    }

    #[test]
    fn file_layer_is_overridden_by_env() {
        let dir = std::env::temp_dir().join(format!("gateway-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(
            &path,
            r#"
                [listener]
                port = 9100

                [backends]
                cart = "cart.internal:7070"

                [logging]
                level = "info"
                format = "text"
            "#,
        )
        .unwrap();

        let mut env = full_env();
        env.remove("CART_SERVICE_ADDR");
        env.insert("PORT", "9200".into());
        let config = load_with(Some(&path), |k| env.get(k).cloned()).unwrap();

        assert_eq!(config.listener.port, 9200);
        assert_eq!(
            config.backends.address(BackendService::Cart),
            Some("cart.internal:7070")
        );
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, crate::config::LogFormat::Text);

        fs::remove_dir_all(&dir).ok();
    }
}
