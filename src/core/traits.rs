use crate::core::{
    errors::ExchangeError,
    types::{Balance, ExchangeId, TradeResult},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Displayed withdrawal fee (BTC) whenever the live estimate cannot be fetched
pub const FALLBACK_WITHDRAWAL_FEE_BTC: Decimal = dec!(0.0005);

#[async_trait]
pub trait AccountInfo {
    /// Non-empty balances only: zero free and zero locked are dropped
    async fn get_account_balances(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<Balance>, ExchangeError>;
}

#[async_trait]
pub trait OrderPlacer {
    /// Size, submit and reduce a market buy of `fiat_amount` in `currency`.
    ///
    /// `fee_percent_hint` comes from the server settings and is only used for
    /// logging; the reported fee is always derived from the execution.
    async fn execute_market_buy(
        &self,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> Result<TradeResult, ExchangeError>;
}

#[async_trait]
pub trait WithdrawalProvider {
    /// Estimated network fee in BTC. Never fails: any error yields
    /// [`FALLBACK_WITHDRAWAL_FEE_BTC`].
    ///
    /// Kraken estimates against a registered withdrawal key, passed as
    /// `destination`; Binance reads the fee of `network` or the default one.
    async fn get_withdrawal_fee(
        &self,
        user_id: Option<&str>,
        destination: Option<&str>,
        network: Option<&str>,
    ) -> Decimal;

    /// Submit a BTC withdrawal and return the venue's reference id.
    ///
    /// `destination` is a raw address except on Kraken, where it is the label
    /// of a pre-registered withdrawal address.
    async fn execute_withdrawal(
        &self,
        destination: &str,
        amount_btc: Decimal,
        network: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String, ExchangeError>;
}

/// One venue's full adapter surface
pub trait ExchangeAdapter: AccountInfo + OrderPlacer + WithdrawalProvider + Send + Sync {
    fn exchange_id(&self) -> ExchangeId;
}
