use crate::core::{
    credentials::CredentialStore,
    errors::ExchangeError,
    kernel::RestClient,
    sizing::{reduce_execution, OrderSizer, SizingConstraints},
    traits::OrderPlacer,
    types::{ExchangeId, ExecutionDetail, FeeAsset, Fill, TradeResult},
};
use crate::exchanges::binance::{
    rest::BinanceRest, signer::BinanceSigner, types::BinanceOrderResponse,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

/// Trading implementation for Binance
pub struct Trading<R: RestClient> {
    rest: BinanceRest<R>,
    credentials: CredentialStore,
    recv_window: u64,
}

impl<R: RestClient + Clone> Trading<R> {
    pub fn new(rest: &R, credentials: CredentialStore, recv_window: u64) -> Self {
        Self {
            rest: BinanceRest::new(rest.clone()),
            credentials,
            recv_window,
        }
    }
}

pub fn symbol_for(currency: &str) -> String {
    format!("BTC{}", currency.to_ascii_uppercase())
}

/// Fills when present, order-level totals otherwise
pub fn execution_detail(order: &BinanceOrderResponse, currency: &str) -> ExecutionDetail {
    if order.fills.is_empty() {
        return ExecutionDetail::OrderLevelOnly {
            executed_qty: order.executed_qty,
            cumulative_quote: order.cumulative_quote_qty,
            quote_fee: Decimal::ZERO,
        };
    }

    ExecutionDetail::FillBased(
        order
            .fills
            .iter()
            .map(|fill| Fill {
                price: fill.price,
                qty: fill.qty,
                commission: fill.commission,
                commission_asset: FeeAsset::classify(&fill.commission_asset, currency),
            })
            .collect(),
    )
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    #[instrument(skip(self), fields(exchange = "binance"))]
    async fn execute_market_buy(
        &self,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> Result<TradeResult, ExchangeError> {
        let currency = currency.to_ascii_uppercase();
        let symbol = symbol_for(&currency);

        let market = self.rest.get_market(&symbol).await?;
        let step_size = market.step_size().ok_or_else(|| {
            ExchangeError::InvalidResponse(format!("{} has no LOT_SIZE filter", symbol))
        })?;
        let constraints = SizingConstraints::from_step_size(step_size, market.min_notional())?;

        let price = self.rest.get_ticker_price(&symbol).await?;
        let spec = OrderSizer::size(ExchangeId::Binance, fiat_amount, &currency, price, constraints)?;
        debug!(%price, quantity = %spec.quantity, ?fee_percent_hint, "placing market buy");

        let signer = BinanceSigner::load(&self.credentials, user_id, self.recv_window).await?;
        let order = self
            .rest
            .place_market_buy(&symbol, &spec.quantity.to_string(), &signer)
            .await?;
        info!(order_id = order.order_id, status = %order.status, fills = order.fills.len(), "market buy filled");

        let executed_at = Utc
            .timestamp_millis_opt(order.transact_time)
            .single()
            .unwrap_or_else(Utc::now);
        reduce_execution(
            order.order_id.to_string(),
            &currency,
            &execution_detail(&order, &currency),
            executed_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_full_response_uses_fills() {
        let order: BinanceOrderResponse = serde_json::from_value(json!({
            "symbol": "BTCEUR",
            "orderId": 28,
            "transactTime": 1_507_725_176_595_i64,
            "status": "FILLED",
            "executedQty": "0.00060000",
            "cummulativeQuoteQty": "34.80000000",
            "fills": [
                {"price": "58000.00", "qty": "0.00060000", "commission": "0.00000060", "commissionAsset": "BTC", "tradeId": 56}
            ]
        }))
        .unwrap();

        match execution_detail(&order, "EUR") {
            ExecutionDetail::FillBased(fills) => {
                assert_eq!(fills.len(), 1);
                assert_eq!(fills[0].commission_asset, FeeAsset::Base);
                assert_eq!(fills[0].commission, dec!(0.0000006));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_fills_falls_back_to_order_level() {
        let order: BinanceOrderResponse = serde_json::from_value(json!({
            "symbol": "BTCEUR",
            "orderId": 29,
            "transactTime": 1_507_725_176_595_i64,
            "status": "FILLED",
            "executedQty": "0.00060000",
            "cummulativeQuoteQty": "34.80000000"
        }))
        .unwrap();

        assert_eq!(
            execution_detail(&order, "EUR"),
            ExecutionDetail::OrderLevelOnly {
                executed_qty: dec!(0.0006),
                cumulative_quote: dec!(34.8),
                quote_fee: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_symbol_uses_uppercase_quote() {
        assert_eq!(symbol_for("eur"), "BTCEUR");
    }
}
