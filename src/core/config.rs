use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const KRAKEN_BASE_URL: &str = "https://api.kraken.com";
pub const COINBASE_BASE_URL: &str = "https://api.coinbase.com";
pub const COINBASE_AUTHORIZE_URL: &str = "https://www.coinbase.com/oauth/authorize";

/// Endpoint and transport settings for every supported venue.
///
/// Holds no per-user secrets: API keys live in the credential store and are
/// re-read on every signed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub binance_base_url: String,
    pub kraken_base_url: String,
    pub coinbase_base_url: String,
    pub coinbase_authorize_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Binance `recvWindow` in milliseconds
    pub recv_window: u64,
    pub oauth: Option<CoinbaseOAuthConfig>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            binance_base_url: BINANCE_BASE_URL.to_string(),
            kraken_base_url: KRAKEN_BASE_URL.to_string(),
            coinbase_base_url: COINBASE_BASE_URL.to_string(),
            coinbase_authorize_url: COINBASE_AUTHORIZE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: "dcakit/0.1".to_string(),
            recv_window: 5000,
            oauth: None,
        }
    }
}

impl ExchangeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Every variable is optional; unset values keep the production defaults:
    /// - `DCAKIT_BINANCE_BASE_URL`, `DCAKIT_KRAKEN_BASE_URL`, `DCAKIT_COINBASE_BASE_URL`
    /// - `DCAKIT_COINBASE_AUTHORIZE_URL`
    /// - `DCAKIT_HTTP_TIMEOUT` (seconds), `DCAKIT_RECV_WINDOW` (milliseconds)
    /// - `DCAKIT_COINBASE_CLIENT_ID` enables OAuth; it then requires
    ///   `DCAKIT_COINBASE_CLIENT_SECRET` and `DCAKIT_COINBASE_REDIRECT_URI`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("DCAKIT_BINANCE_BASE_URL") {
            config.binance_base_url = url;
        }
        if let Ok(url) = env::var("DCAKIT_KRAKEN_BASE_URL") {
            config.kraken_base_url = url;
        }
        if let Ok(url) = env::var("DCAKIT_COINBASE_BASE_URL") {
            config.coinbase_base_url = url;
        }
        if let Ok(url) = env::var("DCAKIT_COINBASE_AUTHORIZE_URL") {
            config.coinbase_authorize_url = url;
        }
        if let Ok(timeout) = env::var("DCAKIT_HTTP_TIMEOUT") {
            config.timeout_seconds = timeout.parse().map_err(|_| {
                ConfigError::InvalidConfiguration(format!("DCAKIT_HTTP_TIMEOUT: {}", timeout))
            })?;
        }
        if let Ok(window) = env::var("DCAKIT_RECV_WINDOW") {
            config.recv_window = window.parse().map_err(|_| {
                ConfigError::InvalidConfiguration(format!("DCAKIT_RECV_WINDOW: {}", window))
            })?;
        }

        if let Ok(client_id) = env::var("DCAKIT_COINBASE_CLIENT_ID") {
            let client_secret = required_var("DCAKIT_COINBASE_CLIENT_SECRET")?;
            let redirect_uri = required_var("DCAKIT_COINBASE_REDIRECT_URI")?;
            let mut oauth = CoinbaseOAuthConfig::new(client_id, client_secret, redirect_uri);
            if let Ok(scope) = env::var("DCAKIT_COINBASE_SCOPE") {
                oauth.scope = scope;
            }
            config.oauth = Some(oauth);
        }

        Ok(config)
    }

    /// Load a `.env` file (if present) and then read the environment
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no file, system environment only
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }

    #[must_use]
    pub fn with_binance_base_url(mut self, url: impl Into<String>) -> Self {
        self.binance_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_kraken_base_url(mut self, url: impl Into<String>) -> Self {
        self.kraken_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_coinbase_base_url(mut self, url: impl Into<String>) -> Self {
        self.coinbase_base_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub const fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    #[must_use]
    pub fn with_oauth(mut self, oauth: CoinbaseOAuthConfig) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// Host the CDP JWT `uris` claim is bound to, e.g. `api.coinbase.com`
    pub fn coinbase_host(&self) -> Result<String, ConfigError> {
        let url = url::Url::parse(&self.coinbase_base_url).map_err(|e| {
            ConfigError::InvalidConfiguration(format!("coinbase_base_url: {}", e))
        })?;
        let host = url.host_str().ok_or_else(|| {
            ConfigError::InvalidConfiguration("coinbase_base_url has no host".to_string())
        })?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvironmentVariable(name.to_string()))
}

/// OAuth client registration for Coinbase retail
#[derive(Debug, Clone)]
pub struct CoinbaseOAuthConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub scope: String,
}

impl CoinbaseOAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: Secret::new(client_secret),
            redirect_uri,
            scope: "wallet:accounts:read,wallet:transactions:send,wallet:buys:create"
                .to_string(),
        }
    }

    /// Get client secret (use carefully - exposes secret)
    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

// Never expose the client secret in serialization
impl Serialize for CoinbaseOAuthConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("CoinbaseOAuthConfig", 4)?;
        state.serialize_field("client_id", &self.client_id)?;
        state.serialize_field("client_secret", "[REDACTED]")?;
        state.serialize_field("redirect_uri", &self.redirect_uri)?;
        state.serialize_field("scope", &self.scope)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for CoinbaseOAuthConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            client_id: String,
            client_secret: String,
            redirect_uri: String,
            scope: Option<String>,
        }

        let helper = Helper::deserialize(deserializer)?;
        let mut config =
            Self::new(helper.client_id, helper.client_secret, helper.redirect_uri);
        if let Some(scope) = helper.scope {
            config.scope = scope;
        }
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_client_secret() {
        let config = ExchangeConfig::new().with_oauth(CoinbaseOAuthConfig::new(
            "client".to_string(),
            "super-secret".to_string(),
            "app://callback".to_string(),
        ));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn test_coinbase_host_includes_port() {
        let config = ExchangeConfig::new();
        assert_eq!(config.coinbase_host().unwrap(), "api.coinbase.com");

        let config = config.with_coinbase_base_url("http://127.0.0.1:4010");
        assert_eq!(config.coinbase_host().unwrap(), "127.0.0.1:4010");
    }
}
