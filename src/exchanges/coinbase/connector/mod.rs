use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AccountInfo, ExchangeAdapter, OrderPlacer, WithdrawalProvider};
use crate::core::types::{Balance, ExchangeId, TradeResult};
use crate::exchanges::coinbase::rest::CoinbaseRest;
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod account;
pub mod trading;
pub mod withdrawal;

pub use account::Account;
pub use trading::Trading;
pub use withdrawal::Withdrawal;

/// Which Coinbase product the connector speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinbaseFlavor {
    /// CDP API keys
    Advanced,
    /// Retail account connected through OAuth
    Retail,
}

impl CoinbaseFlavor {
    pub const fn exchange_id(&self) -> ExchangeId {
        match self {
            Self::Advanced => ExchangeId::CoinbaseAdvanced,
            Self::Retail => ExchangeId::Coinbase,
        }
    }
}

/// Coinbase connector; both flavors share the brokerage and wallet calls
pub struct CoinbaseConnector<R: RestClient> {
    flavor: CoinbaseFlavor,
    pub account: Account<R>,
    pub trading: Trading<R>,
    pub withdrawal: Withdrawal<R>,
}

impl<R: RestClient + Clone> CoinbaseConnector<R> {
    pub fn new(rest: &CoinbaseRest<R>, flavor: CoinbaseFlavor) -> Self {
        Self {
            flavor,
            account: Account::new(rest, flavor),
            trading: Trading::new(rest, flavor),
            withdrawal: Withdrawal::new(rest, flavor),
        }
    }
}

#[async_trait]
impl<R: RestClient + Clone> AccountInfo for CoinbaseConnector<R> {
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError> {
        self.account.get_account_balances(user_id).await
    }
}

#[async_trait]
impl<R: RestClient + Clone> OrderPlacer for CoinbaseConnector<R> {
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
impl<R: RestClient + Clone> WithdrawalProvider for CoinbaseConnector<R> {
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

impl<R: RestClient + Clone> ExchangeAdapter for CoinbaseConnector<R> {
    fn exchange_id(&self) -> ExchangeId {
        self.flavor.exchange_id()
    }
}
