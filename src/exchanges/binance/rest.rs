use crate::core::errors::ExchangeError;
use crate::core::kernel::{decode, RestClient, RestRequest, Signer};
use crate::exchanges::binance::types::{
    BinanceAccountInfo, BinanceCoinConfig, BinanceError, BinanceExchangeInfo, BinanceMarket,
    BinanceOrderResponse, BinanceTickerPrice, BinanceWithdrawResponse,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Thin typed wrapper around `RestClient` for the Binance spot and SAPI surface
#[derive(Clone)]
pub struct BinanceRest<R: RestClient> {
    client: R,
}

impl<R: RestClient> BinanceRest<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    /// `{code, msg}` bodies on non-2xx statuses are venue rejections
    fn map_binance_error(err: ExchangeError) -> ExchangeError {
        match err {
            ExchangeError::HttpStatus { status, body } => {
                match serde_json::from_value::<BinanceError>(body.clone()) {
                    Ok(error) => ExchangeError::business(error.code, error.msg),
                    Err(_) => ExchangeError::HttpStatus { status, body },
                }
            }
            other => other,
        }
    }

    fn handle_response<T: DeserializeOwned>(
        result: Result<Value, ExchangeError>,
        context: &str,
    ) -> Result<T, ExchangeError> {
        decode(result.map_err(Self::map_binance_error)?, context)
    }

    pub async fn get_market(&self, symbol: &str) -> Result<BinanceMarket, ExchangeError> {
        let info: BinanceExchangeInfo = Self::handle_response(
            self.client
                .get("/api/v3/exchangeInfo", &[("symbol", symbol)], None)
                .await,
            "exchangeInfo",
        )?;

        info.symbols
            .into_iter()
            .find(|market| market.symbol == symbol)
            .ok_or_else(|| {
                ExchangeError::Unsupported(format!("Binance does not list {}", symbol))
            })
    }

    pub async fn get_ticker_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let ticker: BinanceTickerPrice = Self::handle_response(
            self.client
                .get("/api/v3/ticker/price", &[("symbol", symbol)], None)
                .await,
            "ticker/price",
        )?;
        Ok(ticker.price)
    }

    pub async fn get_account_info(
        &self,
        signer: &dyn Signer,
    ) -> Result<BinanceAccountInfo, ExchangeError> {
        Self::handle_response(
            self.client
                .get("/api/v3/account", &[("omitZeroBalances", "true")], Some(signer))
                .await,
            "account",
        )
    }

    /// Market buy by base quantity with the full fill report
    pub async fn place_market_buy(
        &self,
        symbol: &str,
        quantity: &str,
        signer: &dyn Signer,
    ) -> Result<BinanceOrderResponse, ExchangeError> {
        let params = [
            ("symbol", symbol),
            ("side", "BUY"),
            ("type", "MARKET"),
            ("quantity", quantity),
            ("newOrderRespType", "FULL"),
        ];
        let request = RestRequest::new(Method::POST, "/api/v3/order").with_query(&params);

        Self::handle_response(self.client.send(request, Some(signer)).await, "order")
    }

    pub async fn get_coin_config(
        &self,
        signer: &dyn Signer,
    ) -> Result<Vec<BinanceCoinConfig>, ExchangeError> {
        Self::handle_response(
            self.client
                .get("/sapi/v1/capital/config/getall", &[], Some(signer))
                .await,
            "capital/config/getall",
        )
    }

    pub async fn withdraw(
        &self,
        address: &str,
        amount: &str,
        network: Option<&str>,
        signer: &dyn Signer,
    ) -> Result<BinanceWithdrawResponse, ExchangeError> {
        let mut params = vec![("coin", "BTC"), ("address", address), ("amount", amount)];
        if let Some(network) = network {
            params.push(("network", network));
        }
        let request =
            RestRequest::new(Method::POST, "/sapi/v1/capital/withdraw/apply").with_query(&params);

        Self::handle_response(self.client.send(request, Some(signer)).await, "withdraw/apply")
    }
}
