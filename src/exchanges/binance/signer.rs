use crate::core::credentials::{ApiKeyCredentials, CredentialStore};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{split_query, SignatureResult, Signer};
use crate::core::signing::hmac_sha256_query;
use crate::core::types::ExchangeId;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

/// Query-string HMAC-SHA256 signer.
///
/// Appends `recvWindow` and `timestamp` to the query, signs the literal
/// string and appends `signature` last.
pub struct BinanceSigner {
    api_key: String,
    secret_key: Secret<String>,
    recv_window: u64,
}

impl BinanceSigner {
    pub fn new(credentials: &ApiKeyCredentials, recv_window: u64) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            secret_key: Secret::new(credentials.secret().to_string()),
            recv_window,
        }
    }

    /// Read the user's keys afresh and build a signer for one call
    pub async fn load(
        credentials: &CredentialStore,
        user_id: Option<&str>,
        recv_window: u64,
    ) -> Result<Self, ExchangeError> {
        let keys = credentials
            .load_api_keys(ExchangeId::Binance, user_id)
            .await?;
        Ok(Self::new(&keys, recv_window))
    }

    pub(crate) fn canonical_query(&self, query_string: &str, timestamp: u64) -> String {
        let suffix = format!("recvWindow={}&timestamp={}", self.recv_window, timestamp);
        if query_string.is_empty() {
            suffix
        } else {
            format!("{}&{}", query_string, suffix)
        }
    }
}

impl Signer for BinanceSigner {
    fn sign_request(
        &self,
        _method: &str,
        _endpoint: &str,
        query_string: &str,
        _body: &[u8],
        timestamp: u64,
    ) -> SignatureResult {
        let full_query = self.canonical_query(query_string, timestamp);
        let signature = hmac_sha256_query(self.secret_key.expose_secret(), &full_query)?;

        let mut headers = HashMap::new();
        headers.insert("X-MBX-APIKEY".to_string(), self.api_key.clone());

        let mut params = split_query(&full_query);
        params.push(("signature".to_string(), signature));

        Ok((headers, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_appended_last() {
        let creds = ApiKeyCredentials::new("key", "secret");
        let signer = BinanceSigner::new(&creds, 5000);
        let (headers, params) = signer
            .sign_request("GET", "/api/v3/account", "omitZeroBalances=true", &[], 1_700_000_000_000)
            .unwrap();

        assert_eq!(headers.get("X-MBX-APIKEY").unwrap(), "key");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["omitZeroBalances", "recvWindow", "timestamp", "signature"]);

        let expected = hmac_sha256_query(
            "secret",
            "omitZeroBalances=true&recvWindow=5000&timestamp=1700000000000",
        )
        .unwrap();
        assert_eq!(params[3].1, expected);
    }

    #[test]
    fn test_empty_query_signs_window_and_timestamp() {
        let creds = ApiKeyCredentials::new("key", "secret");
        let signer = BinanceSigner::new(&creds, 10_000);
        assert_eq!(
            signer.canonical_query("", 42),
            "recvWindow=10000&timestamp=42"
        );
    }
}
