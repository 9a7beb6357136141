use crate::core::config::ExchangeConfig;
use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::binance::connector::BinanceConnector;

/// Build a Binance connector over the reqwest transport
pub fn build_connector(
    config: &ExchangeConfig,
    credentials: CredentialStore,
) -> Result<BinanceConnector<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(config.binance_base_url.clone(), "binance".to_string())
        .with_timeout(config.timeout_seconds)
        .with_user_agent(config.user_agent.clone());
    let rest = RestClientBuilder::new(rest_config).build()?;

    Ok(BinanceConnector::new(&rest, credentials, config.recv_window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::MemoryKeyStore;
    use crate::core::traits::ExchangeAdapter;
    use crate::core::types::ExchangeId;
    use std::sync::Arc;

    #[test]
    fn test_build_connector_with_custom_base_url() {
        let config = ExchangeConfig::new().with_binance_base_url("http://127.0.0.1:9");
        let credentials = CredentialStore::new(Arc::new(MemoryKeyStore::new()));
        let connector = build_connector(&config, credentials).unwrap();
        assert_eq!(connector.exchange_id(), ExchangeId::Binance);
    }
}
