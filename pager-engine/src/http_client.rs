use crate::error::PagerError;
use crate::page::{MAX_RESULTS_FIELD, NEXT_TOKEN_FIELD, Page};
use crate::request::Fields;
use crate::{CloudApi, PageQuery};

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Settings for building an [`HttpApi`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL; operations are posted to `{endpoint}/{operation}`
    pub endpoint: Url,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientSettings {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            api_token: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// `CloudApi` over HTTP with JSON request and response bodies.
///
/// Every operation is a `POST` of the request fields as a JSON object. Page
/// requests carry the continuation token as `NextToken` and the page size as
/// `MaxResults`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: Url,
}

impl HttpApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, PagerError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                PagerError::Config("API token contains characters not allowed in a header".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .default_headers(headers)
            // Keep up to 10 idle connections per host for 90 seconds
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| PagerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: with_trailing_slash(settings.endpoint.clone()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn operation_url(&self, operation: &str) -> Result<Url, PagerError> {
        Ok(self.endpoint.join(operation)?)
    }

    async fn post(&self, operation: &str, body: &Value) -> Result<Value, PagerError> {
        let url = self.operation_url(operation)?;
        debug!("Sending {} request to {}", operation, url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| PagerError::transport(operation, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PagerError::transport(operation, e))?;

        if !status.is_success() {
            return Err(PagerError::Service {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// Url::join replaces the last segment unless the base ends with a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl CloudApi for HttpApi {
    async fn invoke(&self, operation: &str, fields: &Fields) -> Result<Value, PagerError> {
        self.post(operation, &Value::Object(fields.clone())).await
    }

    async fn invoke_page(&self, query: PageQuery<'_>) -> Result<Page, PagerError> {
        let mut body = query.fields.clone();
        if let Some(cursor) = query.cursor {
            body.insert(
                NEXT_TOKEN_FIELD.to_string(),
                Value::String(cursor.as_str().to_string()),
            );
        }
        if let Some(page_size) = query.page_size {
            body.insert(MAX_RESULTS_FIELD.to_string(), Value::from(page_size));
        }

        let response = self.post(query.operation, &Value::Object(body)).await?;
        Page::from_response(response, query.items_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Cursor;
    use log::LevelFilter;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_logger() {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    fn api_for(server: &MockServer) -> HttpApi {
        let settings = ClientSettings {
            api_token: Some("test-token".to_string()),
            ..ClientSettings::new(Url::parse(&server.uri()).unwrap())
        };
        HttpApi::new(&settings).expect("Failed to create client")
    }

    #[tokio::test]
    async fn test_page_request_carries_token_and_page_size() {
        init_logger();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/DescribeInstances"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "Filters": [{"Name": "instance-state-name", "Values": ["running"]}],
                "NextToken": "tok-1",
                "MaxResults": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Reservations": [{"ReservationId": "r-1"}],
                "NextToken": "tok-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Fields::new();
        fields.insert(
            "Filters".to_string(),
            json!([{"Name": "instance-state-name", "Values": ["running"]}]),
        );
        let cursor = Cursor::new("tok-1").unwrap();
        let page = api_for(&server)
            .invoke_page(PageQuery {
                operation: "DescribeInstances",
                fields: &fields,
                cursor: Some(&cursor),
                page_size: Some(5),
                items_key: None,
            })
            .await
            .expect("Failed to fetch page");

        assert_eq!(page.items, vec![json!({"ReservationId": "r-1"})]);
        assert_eq!(page.next_cursor, Cursor::new("tok-2"));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_endpoint_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ec2/CreateVpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Vpc": {"VpcId": "vpc-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Url::parse(&format!("{}/ec2", server.uri())).unwrap();
        let api = HttpApi::new(&ClientSettings::new(endpoint)).unwrap();
        assert!(api.endpoint().path().ends_with("/ec2/"));

        let mut fields = Fields::new();
        fields.insert("CidrBlock".to_string(), json!("10.0.0.0/16"));
        let value = api.invoke("CreateVpc", &fields).await.unwrap();
        assert_eq!(value["Vpc"]["VpcId"], "vpc-1");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_empty_success_body_is_an_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/DeleteVpc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let value = api_for(&server)
            .invoke("DeleteVpc", &Fields::new())
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_service_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/DescribeVpcs"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("InvalidVpcID.NotFound"),
            )
            .mount(&server)
            .await;

        let err = api_for(&server)
            .invoke("DescribeVpcs", &Fields::new())
            .await
            .unwrap_err();
        match err {
            PagerError::Service {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "DescribeVpcs");
                assert_eq!(status, 400);
                assert_eq!(body, "InvalidVpcID.NotFound");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<xml/>"))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .invoke("DescribeRegions", &Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PagerError::Parse(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_gets_network_hint() {
        // Grab a free port, then close it so nothing listens there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();
        let api = HttpApi::new(&ClientSettings::new(endpoint)).unwrap();

        let err = api
            .invoke("DescribeRegions", &Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PagerError::Transport { .. }));
        let hint = err.hint().expect("transport errors carry a hint");
        assert!(hint.contains("could not connect to '127.0.0.1'"), "{}", hint);
        assert!(err.to_string().contains("DescribeRegions"));
    }

    #[tokio::test]
    async fn test_timeout_gets_network_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let settings = ClientSettings {
            request_timeout: Duration::from_millis(50),
            ..ClientSettings::new(Url::parse(&server.uri()).unwrap())
        };
        let err = HttpApi::new(&settings)
            .unwrap()
            .invoke("DescribeRegions", &Fields::new())
            .await
            .unwrap_err();
        assert!(err.hint().unwrap_or_default().contains("timed out"), "{}", err);
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let settings = ClientSettings {
            api_token: Some("bad\ntoken".to_string()),
            ..ClientSettings::new(Url::parse("http://localhost:4566").unwrap())
        };
        let err = HttpApi::new(&settings).unwrap_err();
        assert!(matches!(err, PagerError::Config(_)));
    }
}
