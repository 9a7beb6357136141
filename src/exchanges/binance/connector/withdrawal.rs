use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    traits::{WithdrawalProvider, FALLBACK_WITHDRAWAL_FEE_BTC},
};
use crate::exchanges::binance::{rest::BinanceRest, signer::BinanceSigner};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// Withdrawal implementation for Binance
pub struct Withdrawal<R: RestClient> {
    rest: BinanceRest<R>,
    credentials: CredentialStore,
    recv_window: u64,
}

impl<R: RestClient + Clone> Withdrawal<R> {
    pub fn new(rest: &R, credentials: CredentialStore, recv_window: u64) -> Self {
        Self {
            rest: BinanceRest::new(rest.clone()),
            credentials,
            recv_window,
        }
    }
}

impl<R: RestClient> Withdrawal<R> {
    async fn fetch_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        network: Option<&str>,
    ) -> Result<Decimal, ExchangeError> {
        let signer = BinanceSigner::load(&self.credentials, user_id, self.recv_window).await?;
        let coins = self.rest.get_coin_config(&signer).await?;

        coins
            .iter()
            .find(|coin| coin.coin == "BTC")
            .and_then(|coin| coin.network(network))
            .map(|network| network.withdraw_fee)
            .ok_or_else(|| {
                ExchangeError::InvalidResponse(format!(
                    "no BTC withdrawal network {}",
                    network.unwrap_or("(default)")
                ))
            })
    }
}

#[async_trait]
impl<R: RestClient> WithdrawalProvider for Withdrawal<R> {
    #[instrument(skip(self), fields(exchange = "binance"))]
    async fn get_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        _destination: Option<&str>,
        network: Option<&str>,
    ) -> Decimal {
        match self.fetch_withdrawal_fee(user_id, network).await {
            Ok(fee) => fee,
            Err(e) => {
                warn!(error = %e, "withdrawal fee lookup failed, using fallback");
                FALLBACK_WITHDRAWAL_FEE_BTC
            }
        }
    }

    #[instrument(skip(self, destination), fields(exchange = "binance"))]
    async fn execute_withdrawal(
        &self,
        destination: &str,
        amount_btc: Decimal,
        network: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError> {
        if amount_btc <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let signer = BinanceSigner::load(&self.credentials, user_id, self.recv_window).await?;
        let response = self
            .rest
            .withdraw(destination, &amount_btc.to_string(), network, &signer)
            .await?;

        info!(withdrawal_id = %response.id, "withdrawal submitted");
        Ok(response.id)
    }
}
