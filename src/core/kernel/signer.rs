use crate::core::errors::ExchangeError;
use std::collections::HashMap;

/// Result type for signing operations: (headers, `query_params`)
pub type SignatureResult = Result<(HashMap<String, String>, Vec<(String, String)>), ExchangeError>;

/// Signer trait for request authentication
///
/// Implementations are built per call from freshly read credentials and are
/// dropped once the request has been sent.
pub trait Signer: Send + Sync {
    /// Sign a request and return headers and query parameters
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `endpoint` - API endpoint path
    /// * `query_string` - URL-encoded query string (without leading '?')
    /// * `body` - Raw request body bytes
    /// * `timestamp` - Request timestamp in milliseconds
    ///
    /// # Returns
    /// Tuple of (headers, query params). The returned params replace the
    /// request's query string verbatim and in order.
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: &[u8],
        timestamp: u64,
    ) -> SignatureResult;
}

/// Split an already-encoded query string back into ordered pairs
pub fn split_query(query_string: &str) -> Vec<(String, String)> {
    if query_string.is_empty() {
        return Vec::new();
    }
    query_string
        .split('&')
        .filter_map(|param| {
            param
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

/// Plain bearer-token signer (OAuth access tokens)
pub struct BearerSigner {
    token: secrecy::Secret<String>,
    extra_headers: Vec<(String, String)>,
}

impl BearerSigner {
    pub fn new(token: String) -> Self {
        Self {
            token: secrecy::Secret::new(token),
            extra_headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Signer for BearerSigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        query_string: &str,
        _body: &[u8],
        _timestamp: u64,
    ) -> SignatureResult {
        use secrecy::ExposeSecret;

        let mut headers: HashMap<String, String> = self.extra_headers.iter().cloned().collect();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.expose_secret()),
        );

        Ok((headers, split_query(query_string)))
    }
}
