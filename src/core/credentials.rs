//! Per-exchange, per-user credential storage on top of a secure key-value backend.
//!
//! Nothing here caches: every signed call reads its secrets again, so a
//! credential deleted mid-flow can never be used by a later request.

use crate::core::errors::ExchangeError;
use crate::core::types::ExchangeId;
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Secure key-value collaborator (platform keystore or equivalent)
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ExchangeError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), ExchangeError>;
    async fn delete_item(&self, key: &str) -> Result<(), ExchangeError>;
}

/// In-process `KeyStore`
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ExchangeError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ExchangeError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), ExchangeError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    ApiKey,
    ApiSecret,
    CdpKeyName,
    CdpPrivateKey,
    AccessToken,
    RefreshToken,
    TokenExpiry,
}

impl CredentialField {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::ApiSecret => "api_secret",
            Self::CdpKeyName => "cdp_key_name",
            Self::CdpPrivateKey => "cdp_private_key",
            Self::AccessToken => "oauth_access_token",
            Self::RefreshToken => "oauth_refresh_token",
            Self::TokenExpiry => "oauth_token_expiry",
        }
    }
}

/// How a venue authenticates, and which fields it stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ApiKey,
    Cdp,
    OAuth,
}

impl CredentialKind {
    pub const fn for_exchange(exchange: ExchangeId) -> Self {
        match exchange {
            ExchangeId::Binance | ExchangeId::Kraken => Self::ApiKey,
            ExchangeId::CoinbaseAdvanced => Self::Cdp,
            ExchangeId::Coinbase => Self::OAuth,
        }
    }

    pub const fn fields(&self) -> &'static [CredentialField] {
        match self {
            Self::ApiKey => &[CredentialField::ApiKey, CredentialField::ApiSecret],
            Self::Cdp => &[CredentialField::CdpKeyName, CredentialField::CdpPrivateKey],
            Self::OAuth => &[
                CredentialField::AccessToken,
                CredentialField::RefreshToken,
                CredentialField::TokenExpiry,
            ],
        }
    }
}

/// Composite storage key: `{exchange}_{field}` or `{exchange}_{field}_{user}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub exchange: ExchangeId,
    pub user_id: Option<String>,
    pub field: CredentialField,
}

impl CredentialKey {
    pub fn new(exchange: ExchangeId, user_id: Option<&str>, field: CredentialField) -> Self {
        Self {
            exchange,
            user_id: user_id.filter(|id| !id.is_empty()).map(str::to_string),
            field,
        }
    }

    pub fn storage_key(&self) -> String {
        match &self.user_id {
            Some(user) => format!("{}_{}_{}", self.exchange, self.field.as_str(), user),
            None => format!("{}_{}", self.exchange, self.field.as_str()),
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// HMAC key pair (Binance, Kraken)
#[derive(Clone)]
pub struct ApiKeyCredentials {
    pub api_key: String,
    pub api_secret: Secret<String>,
}

impl ApiKeyCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: Secret::new(api_secret.into()),
        }
    }

    /// Get secret (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Coinbase CDP key: key name plus PEM-encoded EC private key
#[derive(Clone)]
pub struct CdpCredentials {
    pub key_name: String,
    pub private_key: Secret<String>,
}

impl CdpCredentials {
    pub fn new(key_name: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            private_key: Secret::new(private_key_pem.into()),
        }
    }

    pub fn private_key_pem(&self) -> &str {
        self.private_key.expose_secret()
    }
}

impl fmt::Debug for CdpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpCredentials")
            .field("key_name", &self.key_name)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Coinbase retail OAuth tokens
#[derive(Clone)]
pub struct OAuthTokenPair {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    pub expiry_epoch_ms: i64,
}

impl OAuthTokenPair {
    /// Tokens this close to expiry count as expired
    pub const REFRESH_MARGIN_MS: i64 = 60_000;

    pub fn new(access_token: String, refresh_token: String, expiry_epoch_ms: i64) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: Secret::new(refresh_token),
            expiry_epoch_ms,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms + Self::REFRESH_MARGIN_MS >= self.expiry_epoch_ms
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp_millis())
    }
}

impl fmt::Debug for OAuthTokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expiry_epoch_ms", &self.expiry_epoch_ms)
            .finish()
    }
}

/// Keys a caller may store directly. OAuth tokens are only written by the OAuth flow.
#[derive(Debug, Clone)]
pub enum ExchangeKeys {
    ApiKey(ApiKeyCredentials),
    Cdp(CdpCredentials),
}

impl ExchangeKeys {
    pub const fn kind(&self) -> CredentialKind {
        match self {
            Self::ApiKey(_) => CredentialKind::ApiKey,
            Self::Cdp(_) => CredentialKind::Cdp,
        }
    }
}

/// Typed credential access over a `KeyStore`
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyStore>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyStore>) -> Self {
        Self { backend }
    }

    async fn read(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        field: CredentialField,
    ) -> Result<Option<String>, ExchangeError> {
        let key = CredentialKey::new(exchange, user_id, field);
        Ok(self
            .backend
            .get_item(&key.storage_key())
            .await?
            .filter(|value| !value.is_empty()))
    }

    async fn require(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        field: CredentialField,
    ) -> Result<String, ExchangeError> {
        self.read(exchange, user_id, field)
            .await?
            .ok_or(ExchangeError::CredentialsMissing(exchange))
    }

    async fn write(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        field: CredentialField,
        value: &str,
    ) -> Result<(), ExchangeError> {
        let key = CredentialKey::new(exchange, user_id, field);
        self.backend.set_item(&key.storage_key(), value).await
    }

    pub async fn load_api_keys(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
    ) -> Result<ApiKeyCredentials, ExchangeError> {
        let api_key = self.require(exchange, user_id, CredentialField::ApiKey).await?;
        let api_secret = self.require(exchange, user_id, CredentialField::ApiSecret).await?;
        Ok(ApiKeyCredentials::new(api_key, api_secret))
    }

    pub async fn load_cdp(&self, user_id: Option<&str>) -> Result<CdpCredentials, ExchangeError> {
        let exchange = ExchangeId::CoinbaseAdvanced;
        let key_name = self.require(exchange, user_id, CredentialField::CdpKeyName).await?;
        let pem = self.require(exchange, user_id, CredentialField::CdpPrivateKey).await?;
        Ok(CdpCredentials::new(key_name, pem))
    }

    pub async fn load_oauth(&self, user_id: Option<&str>) -> Result<OAuthTokenPair, ExchangeError> {
        let exchange = ExchangeId::Coinbase;
        let access = self.require(exchange, user_id, CredentialField::AccessToken).await?;
        let refresh = self.require(exchange, user_id, CredentialField::RefreshToken).await?;
        let expiry = self
            .require(exchange, user_id, CredentialField::TokenExpiry)
            .await?
            .parse::<i64>()
            // an unreadable expiry forces a refresh
            .unwrap_or(0);
        Ok(OAuthTokenPair::new(access, refresh, expiry))
    }

    #[instrument(skip(self, keys), fields(exchange = %exchange))]
    pub async fn store_keys(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        keys: &ExchangeKeys,
    ) -> Result<(), ExchangeError> {
        if keys.kind() != CredentialKind::for_exchange(exchange) {
            return Err(ExchangeError::InvalidParameters(format!(
                "{} does not accept this kind of key",
                exchange.display_name()
            )));
        }

        match keys {
            ExchangeKeys::ApiKey(creds) => {
                let api_key = creds.api_key.trim();
                let secret = creds.secret().trim();
                if api_key.is_empty() || secret.is_empty() {
                    return Err(ExchangeError::InvalidParameters(
                        "API key and secret are required".to_string(),
                    ));
                }
                self.write(exchange, user_id, CredentialField::ApiKey, api_key)
                    .await?;
                self.write(exchange, user_id, CredentialField::ApiSecret, secret)
                    .await?;
            }
            ExchangeKeys::Cdp(creds) => {
                let key_name = creds.key_name.trim();
                if key_name.is_empty() || creds.private_key_pem().trim().is_empty() {
                    return Err(ExchangeError::InvalidParameters(
                        "Key name and private key are required".to_string(),
                    ));
                }
                self.write(exchange, user_id, CredentialField::CdpKeyName, key_name)
                    .await?;
                self.write(
                    exchange,
                    user_id,
                    CredentialField::CdpPrivateKey,
                    creds.private_key_pem(),
                )
                .await?;
            }
        }

        debug!("stored credentials");
        Ok(())
    }

    pub async fn store_oauth(
        &self,
        user_id: Option<&str>,
        tokens: &OAuthTokenPair,
    ) -> Result<(), ExchangeError> {
        let exchange = ExchangeId::Coinbase;
        self.write(
            exchange,
            user_id,
            CredentialField::AccessToken,
            tokens.access_token.expose_secret(),
        )
        .await?;
        self.write(
            exchange,
            user_id,
            CredentialField::RefreshToken,
            tokens.refresh_token.expose_secret(),
        )
        .await?;
        self.write(
            exchange,
            user_id,
            CredentialField::TokenExpiry,
            &tokens.expiry_epoch_ms.to_string(),
        )
        .await
    }

    /// True only when every field of the venue's credential kind is present
    pub async fn has_credentials(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
    ) -> Result<bool, ExchangeError> {
        for field in CredentialKind::for_exchange(exchange).fields() {
            if self.read(exchange, user_id, *field).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    #[instrument(skip(self), fields(exchange = %exchange))]
    pub async fn delete_credentials(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
    ) -> Result<(), ExchangeError> {
        for field in CredentialKind::for_exchange(exchange).fields() {
            let key = CredentialKey::new(exchange, user_id, *field);
            self.backend.delete_item(&key.storage_key()).await?;
        }
        debug!("deleted credentials");
        Ok(())
    }
}
