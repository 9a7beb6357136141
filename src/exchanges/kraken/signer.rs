use crate::core::credentials::{ApiKeyCredentials, CredentialStore};
use crate::core::errors::{ExchangeError, SigningError};
use crate::core::kernel::{split_query, SignatureResult, Signer};
use crate::core::signing::hmac_sha512_kraken;
use crate::core::types::ExchangeId;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

/// `API-Key`/`API-Sign` signer for `/0/private/*` calls.
///
/// The nonce is read from the form body, so it is signed exactly as sent.
pub struct KrakenSigner {
    api_key: String,
    secret_b64: Secret<String>,
}

impl KrakenSigner {
    pub fn new(credentials: &ApiKeyCredentials) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            secret_b64: Secret::new(credentials.secret().to_string()),
        }
    }

    /// Read the user's keys afresh and build a signer for one call
    pub async fn load(
        credentials: &CredentialStore,
        user_id: Option<&str>,
    ) -> Result<Self, ExchangeError> {
        let keys = credentials.load_api_keys(ExchangeId::Kraken, user_id).await?;
        Ok(Self::new(&keys))
    }
}

fn body_nonce(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "nonce")
        .map(|(_, value)| value.into_owned())
}

impl Signer for KrakenSigner {
    fn sign_request(
        &self,
        _method: &str,
        endpoint: &str,
        query_string: &str,
        body: &[u8],
        _timestamp: u64,
    ) -> SignatureResult {
        let nonce = body_nonce(body).ok_or(SigningError::MissingNonce)?;
        let post_data = String::from_utf8_lossy(body);
        let signature =
            hmac_sha512_kraken(self.secret_b64.expose_secret(), endpoint, &post_data, &nonce)?;

        let mut headers = HashMap::new();
        headers.insert("API-Key".to_string(), self.api_key.clone());
        headers.insert("API-Sign".to_string(), signature);

        Ok((headers, split_query(query_string)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str =
        "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";

    #[test]
    fn test_signs_documented_add_order() {
        let signer = KrakenSigner::new(&ApiKeyCredentials::new("key", SECRET));
        let body = b"nonce=1616492376594&ordertype=limit&pair=XBTUSD&price=37500&type=buy&volume=1.25";
        let (headers, params) = signer
            .sign_request("POST", "/0/private/AddOrder", "", body, 0)
            .unwrap();

        assert_eq!(headers.get("API-Key").unwrap(), "key");
        assert_eq!(
            headers.get("API-Sign").unwrap(),
            "4/dpxb3iT4tp/ZCVEwSnEsLxx0bqyhLpdfOpc6fn7OR8+UClSV5n9E6aSS8MPtnRfp32bAb0nmbRn6H8ndwLUQ=="
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_body_without_nonce_is_a_signing_error() {
        let signer = KrakenSigner::new(&ApiKeyCredentials::new("key", SECRET));
        let err = signer
            .sign_request("POST", "/0/private/Balance", "", b"asset=XBT", 0)
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Signing(SigningError::MissingNonce)));
    }
}
