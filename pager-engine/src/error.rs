use std::error::Error as StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to send {operation} request: {source}{}", format_hint(.hint))]
    Transport {
        operation: String,
        hint: Option<String>,
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {body}")]
    Service {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Failed to write output: {0}")]
    Emit(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scripted failure: {0}")]
    Scripted(String),
}

impl PagerError {
    /// Wraps a transport error, attaching a network hint when one applies.
    pub fn transport(operation: &str, source: reqwest::Error) -> Self {
        let hint = network_hint(&source);
        PagerError::Transport {
            operation: operation.to_string(),
            hint,
            source,
        }
    }

    /// The network hint attached to a transport error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            PagerError::Transport { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

fn format_hint(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" ({})", hint),
        None => String::new(),
    }
}

/// Kind of network failure a transport error was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    Dns,
    Connect,
    Timeout,
}

impl NetworkFailure {
    pub fn describe(&self, host: &str) -> String {
        match self {
            NetworkFailure::Dns => format!(
                "could not resolve host '{}'; check DNS settings and the configured endpoint",
                host
            ),
            NetworkFailure::Connect => format!(
                "could not connect to '{}'; check network connectivity and the configured endpoint",
                host
            ),
            NetworkFailure::Timeout => format!(
                "request to '{}' timed out; check network connectivity or raise the request timeout",
                host
            ),
        }
    }
}

// Substrings hyper/getaddrinfo put in resolver failures across platforms.
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "temporary failure in name resolution",
];

/// Best-effort classification of a reqwest error into a human hint.
pub fn network_hint(err: &reqwest::Error) -> Option<String> {
    let failure = classify(err)?;
    let host = err
        .url()
        .and_then(|url| url.host_str())
        .unwrap_or("the configured endpoint");
    Some(failure.describe(host))
}

fn classify(err: &reqwest::Error) -> Option<NetworkFailure> {
    if err.is_timeout() {
        Some(NetworkFailure::Timeout)
    } else if err.is_connect() {
        if looks_like_dns_failure(err) {
            Some(NetworkFailure::Dns)
        } else {
            Some(NetworkFailure::Connect)
        }
    } else {
        None
    }
}

/// Walks the source chain looking for a resolver failure.
pub(crate) fn looks_like_dns_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let msg = e.to_string().to_ascii_lowercase();
        if DNS_MARKERS.iter().any(|marker| msg.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapper {
        msg: &'static str,
        inner: Option<Box<Wrapper>>,
    }

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.msg)
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.inner.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_dns_failure_found_deep_in_chain() {
        let err = Wrapper {
            msg: "error sending request",
            inner: Some(Box::new(Wrapper {
                msg: "client error (Connect)",
                inner: Some(Box::new(Wrapper {
                    msg: "dns error: failed to lookup address information: Name or service not known",
                    inner: None,
                })),
            })),
        };
        assert!(looks_like_dns_failure(&err));
    }

    #[test]
    fn test_refused_connection_is_not_dns() {
        let err = Wrapper {
            msg: "tcp connect error: Connection refused (os error 111)",
            inner: None,
        };
        assert!(!looks_like_dns_failure(&err));
    }

    #[test]
    fn test_hint_texts_name_the_host() {
        assert!(
            NetworkFailure::Dns
                .describe("ec2.example.invalid")
                .contains("could not resolve host 'ec2.example.invalid'")
        );
        assert!(
            NetworkFailure::Connect
                .describe("127.0.0.1")
                .starts_with("could not connect to '127.0.0.1'")
        );
        assert!(NetworkFailure::Timeout.describe("h").contains("timed out"));
    }

    #[test]
    fn test_service_error_display() {
        let err = PagerError::Service {
            operation: "DescribeInstances".to_string(),
            status: 400,
            body: "InvalidParameterValue".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "DescribeInstances failed with status 400: InvalidParameterValue"
        );
        assert!(err.hint().is_none());
    }
}
