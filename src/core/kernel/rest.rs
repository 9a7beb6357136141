use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{instrument, trace, warn};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request before authentication is applied
#[derive(Debug, Clone)]
pub struct RestRequest<'a> {
    pub method: Method,
    pub endpoint: &'a str,
    /// URL-encoded query string without the leading '?'
    pub query: String,
    pub body: Vec<u8>,
    pub content_type: Option<&'static str>,
}

impl<'a> RestRequest<'a> {
    pub fn new(method: Method, endpoint: &'a str) -> Self {
        Self {
            method,
            endpoint,
            query: String::new(),
            body: Vec::new(),
            content_type: None,
        }
    }

    pub fn with_query(mut self, params: &[(&str, &str)]) -> Self {
        self.query = encode_pairs(params);
        self
    }

    pub fn with_form(mut self, params: &[(&str, &str)]) -> Self {
        self.body = encode_pairs(params).into_bytes();
        self.content_type = Some(FORM_CONTENT_TYPE);
        self
    }

    pub fn with_json(mut self, body: &Value) -> Result<Self, ExchangeError> {
        self.body = serde_json::to_vec(body).map_err(|e| {
            ExchangeError::InvalidParameters(format!("Failed to serialize request body: {}", e))
        })?;
        self.content_type = Some(JSON_CONTENT_TYPE);
        Ok(self)
    }
}

/// `application/x-www-form-urlencoded` serialization, used for both query strings and bodies
pub fn encode_pairs(params: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Join already-encoded pairs without re-encoding them
fn join_encoded(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Deserialize a response body into a venue type
pub fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T, ExchangeError> {
    serde_json::from_value(value)
        .map_err(|e| ExchangeError::InvalidResponse(format!("{}: {}", context, e)))
}

/// REST client trait for making HTTP requests
///
/// Every call distinguishes three outcomes: `Ok(json)` for a 2xx JSON body,
/// `Err(HttpStatus)` for a non-2xx JSON body (left to the venue to classify),
/// and `Err(Transport)` for unreachable hosts or non-JSON bodies.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Send a request, signing it first when a signer is given
    async fn send(
        &self,
        request: RestRequest<'_>,
        signer: Option<&dyn Signer>,
    ) -> Result<Value, ExchangeError>;

    /// Make a GET request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        signer: Option<&dyn Signer>,
    ) -> Result<Value, ExchangeError> {
        self.send(
            RestRequest::new(Method::GET, endpoint).with_query(query_params),
            signer,
        )
        .await
    }

    /// Make a POST request with a JSON body
    async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
        signer: Option<&dyn Signer>,
    ) -> Result<Value, ExchangeError> {
        self.send(RestRequest::new(Method::POST, endpoint).with_json(body)?, signer)
            .await
    }

    /// Make a POST request with a form-encoded body
    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
        signer: Option<&dyn Signer>,
    ) -> Result<Value, ExchangeError> {
        self.send(RestRequest::new(Method::POST, endpoint).with_form(form), signer)
            .await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            timeout_seconds: 30,
            user_agent: "dcakit/0.1".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::Transport(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl ReqwestRest {
    pub fn new(base_url: String, exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(base_url, exchange_name)).build()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the current timestamp in milliseconds
    fn get_timestamp() -> Result<u64, ExchangeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::Transport(format!("Failed to get timestamp: {}", e)))
    }

    fn build_url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query)
        }
    }

    /// Classify the response body: JSON or transport failure
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::Transport(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.is_success() && response_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        match serde_json::from_str::<Value>(&response_text) {
            Ok(value) if status.is_success() => Ok(value),
            Ok(body) => Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            }),
            // 401 keeps its status so callers can refresh credentials
            Err(_) if status == StatusCode::UNAUTHORIZED => Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body: Value::Null,
            }),
            Err(_) => {
                warn!(
                    status = status.as_u16(),
                    bytes = response_text.len(),
                    "non-JSON response body"
                );
                Err(ExchangeError::Transport(format!(
                    "HTTP {} with non-JSON body ({} bytes)",
                    status.as_u16(),
                    response_text.len()
                )))
            }
        }
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, request, signer), fields(exchange = %self.config.exchange_name, method = %request.method, endpoint = %request.endpoint))]
    async fn send(
        &self,
        request: RestRequest<'_>,
        signer: Option<&dyn Signer>,
    ) -> Result<Value, ExchangeError> {
        let (headers, query) = match signer {
            Some(signer) => {
                let timestamp = Self::get_timestamp()?;
                let (headers, signed_params) = signer.sign_request(
                    request.method.as_str(),
                    request.endpoint,
                    &request.query,
                    &request.body,
                    timestamp,
                )?;
                (headers, join_encoded(&signed_params))
            }
            None => (HashMap::new(), request.query.clone()),
        };

        let url = self.build_url(request.endpoint, &query);
        let mut builder = self.client.request(request.method.clone(), &url);

        for (key, value) in headers {
            builder = builder.header(key, value);
        }

        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type).body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_encoding_escapes_values() {
        assert_eq!(
            encode_pairs(&[("address", "bc1q xyz"), ("amount", "0.001")]),
            "address=bc1q+xyz&amount=0.001"
        );
    }

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let rest = ReqwestRest::new("https://api.kraken.com/".to_string(), "kraken".to_string())
            .unwrap();
        assert_eq!(
            rest.build_url("/0/public/Ticker", "pair=XBTEUR"),
            "https://api.kraken.com/0/public/Ticker?pair=XBTEUR"
        );
        assert_eq!(
            rest.build_url("/0/private/Balance", ""),
            "https://api.kraken.com/0/private/Balance"
        );
    }

    #[test]
    fn test_json_request_sets_content_type() {
        let request = RestRequest::new(Method::POST, "/api/v3/brokerage/orders")
            .with_json(&serde_json::json!({"side": "BUY"}))
            .unwrap();
        assert_eq!(request.content_type, Some(JSON_CONTENT_TYPE));
        assert_eq!(request.body, br#"{"side":"BUY"}"#);
    }
}
