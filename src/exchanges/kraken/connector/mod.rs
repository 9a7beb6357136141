use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, ExchangeAdapter, OrderPlacer, WithdrawalProvider};
use crate::core::types::{Balance, ExchangeId, TradeResult};
use crate::exchanges::kraken::rest::KrakenRest;
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod account;
pub mod trading;
pub mod withdrawal;

pub use account::Account;
pub use trading::Trading;
pub use withdrawal::Withdrawal;

/// Kraken connector. All parts share one nonce sequence.
pub struct KrakenConnector<R: RestClient> {
    pub account: Account<R>,
    pub trading: Trading<R>,
    pub withdrawal: Withdrawal<R>,
}

impl<R: RestClient + Clone> KrakenConnector<R> {
    pub fn new(rest: &R, credentials: CredentialStore) -> Self {
        let kraken = KrakenRest::new(rest.clone());
        Self {
            account: Account::new(&kraken, credentials.clone()),
            trading: Trading::new(&kraken, credentials.clone()),
            withdrawal: Withdrawal::new(&kraken, credentials),
        }
    }
}

#[async_trait]
impl<R: RestClient + Clone> AccountInfo for KrakenConnector<R> {
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        self.account.get_account_balances(user_id).await
    }
}

#[async_trait]
impl<R: RestClient + Clone> OrderPlacer for KrakenConnector<R> {
    async fn execute_market_buy(
        &self,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> Result<TradeResult, ExchangeError> {
        self.trading
            .execute_market_buy(fiat_amount, fee_percent_hint, currency, user_id)
            .await
    }
}

#[async_trait]
impl<R: RestClient + Clone> WithdrawalProvider for KrakenConnector<R> {
    async fn get_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        destination: Option<&str>,
        network: Option<&str>,
    ) -> Decimal {
        self.withdrawal
            .get_withdrawal_fee(user_id, destination, network)
            .await
    }

    async fn execute_withdrawal(
        &self,
        destination: &str,
        amount_btc: Decimal,
        network: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError> {
        self.withdrawal
            .execute_withdrawal(destination, amount_btc, network, user_id)
            .await
    }
}

impl<R: RestClient + Clone> ExchangeAdapter for KrakenConnector<R> {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }
}
