use crate::config::endpoint::EndpointConfig;
use config::{Config, ConfigError, Environment};
use pager_engine::{ClientSettings, PagerError};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub mod endpoint;

/// Main configuration structure for the pager
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PagerConfig {
    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

impl PagerConfig {
    /// Creates a new config from `PAGER_*` environment variables
    pub fn new() -> Result<Self, String> {
        Self::from_vars(None)
    }

    /// Reads the given variables instead of the process environment when set.
    pub(crate) fn from_vars(vars: Option<HashMap<String, String>>) -> Result<Self, String> {
        Config::builder()
            .add_source(
                Environment::with_prefix("PAGER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())
    }

    /// Client settings, with `endpoint_override` taking precedence over the config.
    pub fn client_settings(
        &self,
        endpoint_override: Option<&str>,
    ) -> Result<ClientSettings, PagerError> {
        let raw = endpoint_override.unwrap_or(&self.endpoint.url);
        let endpoint = Url::parse(raw)
            .map_err(|e| PagerError::Config(format!("invalid endpoint URL '{}': {}", raw, e)))?;
        if self.endpoint.request_timeout == 0 || self.endpoint.connect_timeout == 0 {
            return Err(PagerError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }

        Ok(ClientSettings {
            endpoint,
            api_token: self.api_token.clone().filter(|token| !token.is_empty()),
            request_timeout: Duration::from_secs(self.endpoint.request_timeout),
            connect_timeout: Duration::from_secs(self.endpoint.connect_timeout),
        })
    }
}
