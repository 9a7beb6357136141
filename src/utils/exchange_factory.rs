use crate::core::{
    config::ExchangeConfig, credentials::CredentialStore, errors::ExchangeError,
    traits::ExchangeAdapter, types::ExchangeId,
};
use crate::exchanges::{binance, coinbase, kraken};

/// Builds boxed adapters so callers can dispatch on an [`ExchangeId`]
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Create the adapter for `exchange`.
    ///
    /// Coinbase retail fails with `Unsupported` unless an OAuth client is configured.
    pub fn create_adapter(
        exchange: ExchangeId,
        config: &ExchangeConfig,
        credentials: CredentialStore,
    ) -> Result<Box<dyn ExchangeAdapter>, ExchangeError> {
        match exchange {
            ExchangeId::Binance => Ok(Box::new(binance::build_connector(config, credentials)?)),
            ExchangeId::Kraken => Ok(Box::new(kraken::build_connector(config, credentials)?)),
            ExchangeId::CoinbaseAdvanced => Ok(Box::new(coinbase::build_advanced_connector(
                config,
                credentials,
            )?)),
            ExchangeId::Coinbase => Ok(Box::new(coinbase::build_retail_connector(
                config,
                credentials,
            )?)),
        }
    }

    /// Every adapter the configuration allows; Coinbase retail is skipped without OAuth
    pub fn create_all(
        config: &ExchangeConfig,
        credentials: &CredentialStore,
    ) -> Result<Vec<Box<dyn ExchangeAdapter>>, ExchangeError> {
        let mut adapters = Vec::with_capacity(ExchangeId::ALL.len());
        for exchange in ExchangeId::ALL {
            if exchange == ExchangeId::Coinbase && config.oauth.is_none() {
                continue;
            }
            adapters.push(Self::create_adapter(exchange, config, credentials.clone())?);
        }
        Ok(adapters)
    }
}
