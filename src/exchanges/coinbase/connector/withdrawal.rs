use crate::core::{errors::ExchangeError, kernel::RestClient, traits::WithdrawalProvider};
use crate::exchanges::coinbase::{
    connector::{Account, CoinbaseFlavor},
    rest::CoinbaseRest,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument};

/// Coinbase absorbs most of the on-chain cost; this is the displayed estimate
pub const COINBASE_NETWORK_FEE_BTC: Decimal = dec!(0.0001);

pub const DEFAULT_NETWORK: &str = "bitcoin";

pub struct Withdrawal<R: RestClient> {
    rest: CoinbaseRest<R>,
    account: Account<R>,
}

impl<R: RestClient + Clone> Withdrawal<R> {
    pub fn new(rest: &CoinbaseRest<R>, flavor: CoinbaseFlavor) -> Self {
        Self {
            rest: rest.clone(),
            account: Account::new(rest, flavor),
        }
    }
}

#[async_trait]
impl<R: RestClient> WithdrawalProvider for Withdrawal<R> {
    async fn get_withdrawal_fee(
        &self,
        _user_id: Option<&str>,
        _destination: Option<&str>,
        _network: Option<&str>,
    ) -> Decimal {
        COINBASE_NETWORK_FEE_BTC
    }

    #[instrument(skip(self), fields(exchange = "coinbase"))]
    async fn execute_withdrawal(
        &self,
        destination: &str,
        amount_btc: Decimal,
        network: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError> {
        if destination.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "A destination address is required".to_string(),
            ));
        }
        if amount_btc <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let account_id = self.account.btc_account_id(user_id).await?;
        let network = network.unwrap_or(DEFAULT_NETWORK);
        let transaction = self
            .rest
            .send_bitcoin(&account_id, destination, &amount_btc.to_string(), network, user_id)
            .await?;

        info!(id = %transaction.id, status = %transaction.status, "withdrawal submitted");
        Ok(transaction.id)
    }
}
