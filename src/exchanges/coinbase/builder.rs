use crate::core::config::ExchangeConfig;
use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::coinbase::{
    auth::CoinbaseAuth,
    connector::{CoinbaseConnector, CoinbaseFlavor},
    oauth::CoinbaseOAuth,
    rest::CoinbaseRest,
};

fn build_transport(config: &ExchangeConfig) -> Result<ReqwestRest, ExchangeError> {
    let rest_config =
        RestClientConfig::new(config.coinbase_base_url.clone(), "coinbase".to_string())
            .with_timeout(config.timeout_seconds)
            .with_user_agent(config.user_agent.clone());
    RestClientBuilder::new(rest_config).build()
}

/// OAuth token lifecycle; fails when no OAuth client is configured
pub fn build_oauth(
    config: &ExchangeConfig,
    credentials: CredentialStore,
) -> Result<CoinbaseOAuth<ReqwestRest>, ExchangeError> {
    let oauth = config.oauth.clone().ok_or_else(|| {
        ExchangeError::Unsupported("Coinbase OAuth client is not configured".to_string())
    })?;
    Ok(CoinbaseOAuth::new(
        build_transport(config)?,
        oauth,
        config.coinbase_authorize_url.clone(),
        credentials,
    ))
}

/// Coinbase Advanced Trade authorized with CDP keys
pub fn build_advanced_connector(
    config: &ExchangeConfig,
    credentials: CredentialStore,
) -> Result<CoinbaseConnector<ReqwestRest>, ExchangeError> {
    let auth = CoinbaseAuth::Cdp {
        credentials,
        host: config.coinbase_host()?,
    };
    let rest = CoinbaseRest::new(build_transport(config)?, auth);
    Ok(CoinbaseConnector::new(&rest, CoinbaseFlavor::Advanced))
}

/// Retail Coinbase authorized with the user's OAuth tokens
pub fn build_retail_connector(
    config: &ExchangeConfig,
    credentials: CredentialStore,
) -> Result<CoinbaseConnector<ReqwestRest>, ExchangeError> {
    let auth = CoinbaseAuth::OAuth(build_oauth(config, credentials)?);
    let rest = CoinbaseRest::new(build_transport(config)?, auth);
    Ok(CoinbaseConnector::new(&rest, CoinbaseFlavor::Retail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CoinbaseOAuthConfig;
    use crate::core::credentials::MemoryKeyStore;
    use crate::core::traits::ExchangeAdapter;
    use crate::core::types::ExchangeId;
    use std::sync::Arc;

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryKeyStore::new()))
    }

    #[test]
    fn test_retail_requires_oauth_client() {
        let config = ExchangeConfig::new();
        assert!(matches!(
            build_retail_connector(&config, credentials()),
            Err(ExchangeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_both_flavors_report_their_id() {
        let config = ExchangeConfig::new().with_oauth(CoinbaseOAuthConfig::new(
            "client".to_string(),
            "secret".to_string(),
            "dcakit://oauth/callback".to_string(),
        ));

        let advanced = build_advanced_connector(&config, credentials()).unwrap();
        let retail = build_retail_connector(&config, credentials()).unwrap();
        assert_eq!(advanced.exchange_id(), ExchangeId::CoinbaseAdvanced);
        assert_eq!(retail.exchange_id(), ExchangeId::Coinbase);
    }
}
