use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RestClient, RestRequest};
use crate::exchanges::coinbase::oauth::CoinbaseOAuth;
use crate::exchanges::coinbase::signer::CdpSigner;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::warn;

/// How a Coinbase request is authorized
#[derive(Clone)]
pub enum CoinbaseAuth<R: RestClient> {
    /// CDP key: self-issued ES256 JWT per request
    Cdp {
        credentials: CredentialStore,
        host: String,
    },
    /// Retail OAuth bearer token
    OAuth(CoinbaseOAuth<R>),
}

fn is_unauthorized(result: &Result<Value, ExchangeError>) -> bool {
    matches!(result, Err(ExchangeError::HttpStatus { status: 401, .. }))
}

impl<R: RestClient> CoinbaseAuth<R> {
    /// Send `request` authorized for `user_id`.
    ///
    /// An OAuth 401 is retried exactly once after a forced refresh; a second
    /// 401 disconnects the account.
    pub async fn send(
        &self,
        client: &R,
        request: RestRequest<'_>,
        user_id: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        match self {
            Self::Cdp { credentials, host } => {
                let keys = credentials.load_cdp(user_id).await?;
                let signer = CdpSigner::new(&keys, host.as_str());
                client.send(request, Some(&signer)).await
            }
            Self::OAuth(oauth) => {
                let token = oauth.valid_access_token(user_id).await?;
                let signer = CoinbaseOAuth::<R>::bearer(&token);
                let first = client.send(request.clone(), Some(&signer)).await;
                if !is_unauthorized(&first) {
                    return first;
                }

                warn!(endpoint = request.endpoint, "access token rejected, refreshing once");
                let tokens = oauth.refresh(user_id).await?;
                let signer = CoinbaseOAuth::<R>::bearer(tokens.access_token.expose_secret());
                let second = client.send(request, Some(&signer)).await;
                if is_unauthorized(&second) {
                    oauth.disconnect(user_id).await?;
                    return Err(ExchangeError::ReauthRequired(
                        "access token rejected after refresh".to_string(),
                    ));
                }
                second
            }
        }
    }
}
