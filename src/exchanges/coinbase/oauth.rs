//! Coinbase retail OAuth2 with PKCE: authorization, code exchange, token
//! refresh and revocation.
//!
//! Access tokens within a minute of expiry are refreshed before use. A
//! refused refresh deletes the stored pair and demands reconnection.

use crate::core::config::CoinbaseOAuthConfig;
use crate::core::credentials::{CredentialStore, OAuthTokenPair};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{decode, BearerSigner, RestClient};
use crate::core::types::ExchangeId;
use crate::exchanges::coinbase::signer::CB_VERSION;
use crate::exchanges::coinbase::types::OAuthTokenResponse;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{Rng, RngCore};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

const TOKEN_PATH: &str = "/oauth/token";
const REVOKE_PATH: &str = "/oauth/revoke";
const VERIFIER_LEN: usize = 64;
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE verifier, its S256 challenge, and the anti-CSRF `state`
#[derive(Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .field("state", &self.state)
            .finish()
    }
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let verifier: String = (0..VERIFIER_LEN)
            .map(|_| char::from(UNRESERVED[rng.gen_range(0..UNRESERVED.len())]))
            .collect();

        let mut state = [0u8; 16];
        rng.fill_bytes(&mut state);

        Self::with_state(verifier, hex::encode(state))
    }

    pub fn with_state(verifier: String, state: String) -> Self {
        let challenge = Self::s256(&verifier);
        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// `base64url(SHA256(verifier))` without padding
    pub fn s256(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

/// Token lifecycle for one Coinbase OAuth client registration
#[derive(Clone)]
pub struct CoinbaseOAuth<R: RestClient> {
    client: R,
    config: CoinbaseOAuthConfig,
    authorize_url: String,
    credentials: CredentialStore,
}

impl<R: RestClient> CoinbaseOAuth<R> {
    pub fn new(
        client: R,
        config: CoinbaseOAuthConfig,
        authorize_url: impl Into<String>,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            client,
            config,
            authorize_url: authorize_url.into(),
            credentials,
        }
    }

    /// URL the user opens to grant access
    pub fn authorization_url(&self, pkce: &PkceChallenge) -> Result<String, ExchangeError> {
        let url = url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", pkce.state.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| ExchangeError::InvalidParameters(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    /// Bearer signer for an access token
    pub fn bearer(access_token: &str) -> BearerSigner {
        BearerSigner::new(access_token.to_string()).with_header("CB-VERSION", CB_VERSION)
    }

    fn tokens_from(
        response: OAuthTokenResponse,
        previous_refresh: Option<&str>,
    ) -> Result<OAuthTokenPair, ExchangeError> {
        let refresh_token = response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| {
                ExchangeError::InvalidResponse("token response has no refresh_token".to_string())
            })?;
        let expiry = chrono::Utc::now().timestamp_millis() + response.expires_in.max(0) * 1000;
        Ok(OAuthTokenPair::new(response.access_token, refresh_token, expiry))
    }

    /// Exchange an authorization code for tokens and store them
    #[instrument(skip(self, code, verifier), fields(exchange = "coinbase"))]
    pub async fn exchange_code(
        &self,
        user_id: Option<&str>,
        code: &str,
        verifier: &str,
    ) -> Result<(), ExchangeError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];

        let response: OAuthTokenResponse = match self.client.post_form(TOKEN_PATH, &form, None).await {
            Ok(value) => decode(value, "oauth/token")?,
            Err(ExchangeError::HttpStatus { status, .. }) if (400..500).contains(&status) => {
                warn!(status, "authorization code rejected");
                return Err(ExchangeError::ReauthRequired(
                    "authorization code rejected".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        let tokens = Self::tokens_from(response, None)?;
        self.credentials.store_oauth(user_id, &tokens).await?;
        info!("coinbase account connected");
        Ok(())
    }

    /// Refresh with the stored refresh token. A refusal deletes the stored pair.
    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn refresh(&self, user_id: Option<&str>) -> Result<OAuthTokenPair, ExchangeError> {
        let current = self.credentials.load_oauth(user_id).await?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.expose_secret().as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret()),
        ];

        let response: OAuthTokenResponse = match self.client.post_form(TOKEN_PATH, &form, None).await {
            Ok(value) => decode(value, "oauth/token")?,
            Err(ExchangeError::HttpStatus { status, .. }) if (400..500).contains(&status) => {
                warn!(status, "refresh token refused, disconnecting");
                self.credentials
                    .delete_credentials(ExchangeId::Coinbase, user_id)
                    .await?;
                return Err(ExchangeError::ReauthRequired(
                    "refresh token refused".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        let tokens = Self::tokens_from(response, Some(current.refresh_token.expose_secret()))?;
        self.credentials.store_oauth(user_id, &tokens).await?;
        debug!(expiry_epoch_ms = tokens.expiry_epoch_ms, "access token refreshed");
        Ok(tokens)
    }

    /// Stored access token, refreshed first when it is within a minute of expiry
    pub async fn valid_access_token(&self, user_id: Option<&str>) -> Result<String, ExchangeError> {
        let tokens = self.credentials.load_oauth(user_id).await?;
        if tokens.is_expired() {
            debug!("access token near expiry, refreshing");
            let refreshed = self.refresh(user_id).await?;
            return Ok(refreshed.access_token.expose_secret().clone());
        }
        Ok(tokens.access_token.expose_secret().clone())
    }

    /// Drop the stored pair after a second authorization failure
    pub async fn disconnect(&self, user_id: Option<&str>) -> Result<(), ExchangeError> {
        self.credentials
            .delete_credentials(ExchangeId::Coinbase, user_id)
            .await
    }

    /// Best-effort revocation at Coinbase, then local deletion
    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn revoke(&self, user_id: Option<&str>) -> Result<(), ExchangeError> {
        if let Ok(tokens) = self.credentials.load_oauth(user_id).await {
            let form = [
                ("token", tokens.access_token.expose_secret().as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret()),
            ];
            if let Err(e) = self.client.post_form(REVOKE_PATH, &form, None).await {
                warn!(error = %e, "token revocation failed");
            }
        }
        self.disconnect(user_id).await
    }
}
