use crate::core::credentials::CredentialStore;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, ExchangeAdapter, OrderPlacer, WithdrawalProvider};
use crate::core::types::{Balance, ExchangeId, TradeResult};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod account;
pub mod trading;
pub mod withdrawal;

pub use account::Account;
pub use trading::Trading;
pub use withdrawal::Withdrawal;

/// Binance connector that composes the account, trading and withdrawal parts
pub struct BinanceConnector<R: RestClient> {
    pub account: Account<R>,
    pub trading: Trading<R>,
    pub withdrawal: Withdrawal<R>,
}

impl<R: RestClient + Clone> BinanceConnector<R> {
    pub fn new(rest: &R, credentials: CredentialStore, recv_window: u64) -> Self {
        Self {
            account: Account::new(rest, credentials.clone(), recv_window),
            trading: Trading::new(rest, credentials.clone(), recv_window),
            withdrawal: Withdrawal::new(rest, credentials, recv_window),
        }
    }
}

#[async_trait]
impl<R: RestClient + Clone> AccountInfo for BinanceConnector<R> {
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        self.account.get_account_balances(user_id).await
    }
}

#[async_trait]
impl<R: RestClient + Clone> OrderPlacer for BinanceConnector<R> {
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
impl<R: RestClient + Clone> WithdrawalProvider for BinanceConnector<R> {
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

impl<R: RestClient + Clone> ExchangeAdapter for BinanceConnector<R> {
    fn exchange_id(&self) -> ExchangeId {
        ExchangeId::Binance
    }
}
