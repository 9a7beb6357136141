//! Single caller-facing entry point.
//!
//! Every method resolves the adapter for an [`ExchangeId`], hides the venue's
//! parameter quirks and renders the outcome as an [`ApiResponse`], so no
//! error escapes to the caller as anything but a user-facing message.

use crate::core::{
    config::ExchangeConfig,
    credentials::{CredentialStore, ExchangeKeys, KeyStore},
    errors::ExchangeError,
    geo,
    kernel::ReqwestRest,
    signing::es256_verifying_key,
    traits::{ExchangeAdapter, FALLBACK_WITHDRAWAL_FEE_BTC},
    types::{ApiResponse, Balance, ExchangeId, TradeResult, WithdrawalResult},
};
use crate::exchanges::coinbase::{self, CoinbaseOAuth, PkceChallenge};
use crate::utils::ExchangeFactory;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Network Coinbase expects for on-chain BTC sends
pub const COINBASE_WITHDRAWAL_NETWORK: &str = "bitcoin";

/// Generic `network` argument rewritten for `exchange`
pub fn withdrawal_network(exchange: ExchangeId, network: Option<&str>) -> Option<&str> {
    match exchange {
        ExchangeId::Binance => network.filter(|n| !n.trim().is_empty()),
        // the destination is a pre-registered key name
        ExchangeId::Kraken => None,
        ExchangeId::CoinbaseAdvanced | ExchangeId::Coinbase => Some(COINBASE_WITHDRAWAL_NETWORK),
    }
}

/// What the caller needs to send the user to Coinbase and later finish the flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthStart {
    pub authorization_url: String,
    pub code_verifier: String,
    pub state: String,
}

fn respond<T>(exchange: ExchangeId, operation: &str, result: Result<T, ExchangeError>) -> ApiResponse<T> {
    if let Err(e) = &result {
        warn!(%exchange, operation, error = %e, "exchange call failed");
    }
    ApiResponse::from(result)
}

pub struct ExchangeFacade {
    credentials: CredentialStore,
    adapters: HashMap<ExchangeId, Box<dyn ExchangeAdapter>>,
    oauth: Option<CoinbaseOAuth<ReqwestRest>>,
}

impl ExchangeFacade {
    /// Build every adapter the configuration allows over `key_store`
    pub fn new(config: &ExchangeConfig, key_store: Arc<dyn KeyStore>) -> Result<Self, ExchangeError> {
        let credentials = CredentialStore::new(key_store);
        let adapters = ExchangeFactory::create_all(config, &credentials)?
            .into_iter()
            .map(|adapter| (adapter.exchange_id(), adapter))
            .collect();
        let oauth = match config.oauth {
            Some(_) => Some(coinbase::build_oauth(config, credentials.clone())?),
            None => None,
        };

        Ok(Self {
            credentials,
            adapters,
            oauth,
        })
    }

    fn adapter(&self, exchange: ExchangeId) -> Result<&dyn ExchangeAdapter, ExchangeError> {
        self.adapters
            .get(&exchange)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| {
                ExchangeError::Unsupported(format!(
                    "{} is not configured",
                    exchange.display_name()
                ))
            })
    }

    fn oauth(&self) -> Result<&CoinbaseOAuth<ReqwestRest>, ExchangeError> {
        self.oauth.as_ref().ok_or_else(|| {
            ExchangeError::Unsupported("Coinbase OAuth is not configured".to_string())
        })
    }

    pub fn get_available_exchanges_for_user(&self, country_code: &str) -> ApiResponse<Vec<ExchangeId>> {
        ApiResponse::ok(geo::eligible_exchanges(country_code))
    }

    #[instrument(skip(self, keys))]
    pub async fn store_exchange_keys(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        keys: ExchangeKeys,
    ) -> ApiResponse<()> {
        respond(exchange, "store_keys", self.store_keys(exchange, user_id, &keys).await)
    }

    async fn store_keys(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        keys: &ExchangeKeys,
    ) -> Result<(), ExchangeError> {
        if exchange.uses_oauth() {
            return Err(ExchangeError::InvalidParameters(
                "Coinbase connects through OAuth - use the OAuth flow instead of API keys"
                    .to_string(),
            ));
        }
        if let ExchangeKeys::Cdp(cdp) = keys {
            es256_verifying_key(cdp.private_key_pem())?;
        }
        self.credentials.store_keys(exchange, user_id, keys).await
    }

    pub async fn has_exchange_keys(&self, exchange: ExchangeId, user_id: Option<&str>) -> ApiResponse<bool> {
        respond(
            exchange,
            "has_keys",
            self.credentials.has_credentials(exchange, user_id).await,
        )
    }

    /// Coinbase retail tokens are revoked at Coinbase before local deletion
    #[instrument(skip(self))]
    pub async fn delete_exchange_keys(&self, exchange: ExchangeId, user_id: Option<&str>) -> ApiResponse<()> {
        let result = match (exchange, &self.oauth) {
            (ExchangeId::Coinbase, Some(oauth)) => oauth.revoke(user_id).await,
            _ => self.credentials.delete_credentials(exchange, user_id).await,
        };
        respond(exchange, "delete_keys", result)
    }

    pub async fn get_account_balances(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
    ) -> ApiResponse<Vec<Balance>> {
        let result = match self.adapter(exchange) {
            Ok(adapter) => adapter.get_account_balances(user_id).await,
            Err(e) => Err(e),
        };
        respond(exchange, "balances", result)
    }

    /// `destination` is only used by Kraken, as the withdrawal key name.
    /// Always succeeds; an unconfigured exchange yields the fallback estimate.
    pub async fn get_withdrawal_fee(
        &self,
        exchange: ExchangeId,
        user_id: Option<&str>,
        destination: Option<&str>,
        network: Option<&str>,
    ) -> ApiResponse<Decimal> {
        let network = withdrawal_network(exchange, network);
        let fee = match self.adapter(exchange) {
            Ok(adapter) => adapter.get_withdrawal_fee(user_id, destination, network).await,
            Err(e) => {
                warn!(%exchange, error = %e, "no adapter, using fallback withdrawal fee");
                FALLBACK_WITHDRAWAL_FEE_BTC
            }
        };
        ApiResponse::ok(fee)
    }

    #[instrument(skip(self, destination))]
    pub async fn execute_withdrawal(
        &self,
        exchange: ExchangeId,
        destination: &str,
        amount_btc: Decimal,
        network: Option<&str>,
        user_id: Option<&str>,
    ) -> WithdrawalResult {
        let network = withdrawal_network(exchange, network);
        let result = match self.adapter(exchange) {
            Ok(adapter) => {
                adapter
                    .execute_withdrawal(destination, amount_btc, network, user_id)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(tx_id) => {
                info!(%exchange, %tx_id, "withdrawal accepted");
                WithdrawalResult::submitted(tx_id)
            }
            Err(e) => {
                warn!(%exchange, error = %e, "withdrawal failed");
                WithdrawalResult::failed(e.user_message())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn execute_market_buy(
        &self,
        exchange: ExchangeId,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> ApiResponse<TradeResult> {
        let result = match self.adapter(exchange) {
            Ok(adapter) => {
                adapter
                    .execute_market_buy(fiat_amount, fee_percent_hint, currency, user_id)
                    .await
            }
            Err(e) => Err(e),
        };
        respond(exchange, "market_buy", result)
    }

    /// Start a PKCE authorization; the caller keeps the verifier until the redirect
    pub fn begin_coinbase_oauth(&self) -> ApiResponse<OAuthStart> {
        let result = self.oauth().and_then(|oauth| {
            let pkce = PkceChallenge::generate();
            let authorization_url = oauth.authorization_url(&pkce)?;
            Ok(OAuthStart {
                authorization_url,
                code_verifier: pkce.verifier,
                state: pkce.state,
            })
        });
        respond(ExchangeId::Coinbase, "oauth_begin", result)
    }

    #[instrument(skip(self, code, code_verifier))]
    pub async fn complete_coinbase_oauth(
        &self,
        user_id: Option<&str>,
        code: &str,
        code_verifier: &str,
    ) -> ApiResponse<()> {
        let result = match self.oauth() {
            Ok(oauth) => oauth.exchange_code(user_id, code, code_verifier).await,
            Err(e) => Err(e),
        };
        respond(ExchangeId::Coinbase, "oauth_complete", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::{ApiKeyCredentials, CdpCredentials, MemoryKeyStore};
    use crate::core::signing::tests::TEST_EC_PEM;

    fn facade() -> ExchangeFacade {
        ExchangeFacade::new(&ExchangeConfig::new(), Arc::new(MemoryKeyStore::new())).unwrap()
    }

    #[test]
    fn test_network_rewrite_per_exchange() {
        assert_eq!(withdrawal_network(ExchangeId::Binance, Some("BTC")), Some("BTC"));
        assert_eq!(withdrawal_network(ExchangeId::Binance, None), None);
        assert_eq!(withdrawal_network(ExchangeId::Kraken, Some("BTC")), None);
        assert_eq!(
            withdrawal_network(ExchangeId::CoinbaseAdvanced, Some("BTC")),
            Some("bitcoin")
        );
        assert_eq!(withdrawal_network(ExchangeId::Coinbase, None), Some("bitcoin"));
    }

    #[tokio::test]
    async fn test_coinbase_retail_rejects_direct_keys() {
        let facade = facade();
        let response = facade
            .store_exchange_keys(
                ExchangeId::Coinbase,
                None,
                ExchangeKeys::ApiKey(ApiKeyCredentials::new("key", "secret")),
            )
            .await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("OAuth"));
    }

    #[tokio::test]
    async fn test_store_has_delete_cycle() {
        let facade = facade();
        let keys = ExchangeKeys::ApiKey(ApiKeyCredentials::new("key", "secret"));

        assert!(facade.store_exchange_keys(ExchangeId::Kraken, Some("u1"), keys).await.success);
        assert_eq!(
            facade.has_exchange_keys(ExchangeId::Kraken, Some("u1")).await.data,
            Some(true)
        );
        assert_eq!(
            facade.has_exchange_keys(ExchangeId::Kraken, Some("u2")).await.data,
            Some(false)
        );

        assert!(facade.delete_exchange_keys(ExchangeId::Kraken, Some("u1")).await.success);
        assert_eq!(
            facade.has_exchange_keys(ExchangeId::Kraken, Some("u1")).await.data,
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_malformed_cdp_key_rejected_at_store() {
        let facade = facade();
        let bad = ExchangeKeys::Cdp(CdpCredentials::new("organizations/o/apiKeys/k", "not a pem"));
        let response = facade
            .store_exchange_keys(ExchangeId::CoinbaseAdvanced, None, bad)
            .await;
        assert!(!response.success);

        let good = ExchangeKeys::Cdp(CdpCredentials::new("organizations/o/apiKeys/k", TEST_EC_PEM));
        assert!(facade
            .store_exchange_keys(ExchangeId::CoinbaseAdvanced, None, good)
            .await
            .success);
    }

    #[tokio::test]
    async fn test_retail_without_oauth_is_unsupported() {
        let facade = facade();
        assert!(!facade.begin_coinbase_oauth().success);
        let balances = facade.get_account_balances(ExchangeId::Coinbase, None).await;
        assert!(!balances.success);
        assert!(balances.error.unwrap().contains("not configured"));

        let fee = facade
            .get_withdrawal_fee(ExchangeId::Coinbase, None, None, None)
            .await;
        assert!(fee.success);
        assert_eq!(fee.data, Some(FALLBACK_WITHDRAWAL_FEE_BTC));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let facade = facade();
        let response = facade
            .execute_withdrawal(ExchangeId::Binance, "bc1qexample", Decimal::ONE, None, None)
            .await;
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("No API credentials configured for Binance")
        );
    }
}
