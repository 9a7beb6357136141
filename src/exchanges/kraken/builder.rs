use crate::core::config::ExchangeConfig;
use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::kraken::connector::KrakenConnector;

/// Build a Kraken connector over the reqwest transport
pub fn build_connector(
    config: &ExchangeConfig,
    credentials: CredentialStore,
) -> Result<KrakenConnector<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(config.kraken_base_url.clone(), "kraken".to_string())
        .with_timeout(config.timeout_seconds)
        .with_user_agent(config.user_agent.clone());
    let rest = RestClientBuilder::new(rest_config).build()?;

    Ok(KrakenConnector::new(&rest, credentials))
}
