use serde::Deserialize;

/// Configuration for the cloud API endpoint
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// The base URL of the API (default: http://localhost:4566)
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// The timeout for a whole request in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// The timeout for establishing a connection in seconds (default: 5)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_endpoint_url() -> String {
    "http://localhost:4566".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}
