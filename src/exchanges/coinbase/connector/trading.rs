use crate::core::{
    errors::ExchangeError,
    kernel::RestClient,
    sizing::{reduce_execution, OrderSizer, SizingConstraints},
    traits::OrderPlacer,
    types::{ExecutionDetail, FeeAsset, Fill, TradeResult},
};
use crate::exchanges::coinbase::{
    connector::CoinbaseFlavor,
    rest::CoinbaseRest,
    types::{CoinbaseFill, CoinbaseOrderSummary},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

pub struct Trading<R: RestClient> {
    rest: CoinbaseRest<R>,
    flavor: CoinbaseFlavor,
}

impl<R: RestClient + Clone> Trading<R> {
    pub fn new(rest: &CoinbaseRest<R>, flavor: CoinbaseFlavor) -> Self {
        Self {
            rest: rest.clone(),
            flavor,
        }
    }
}

pub fn product_for(currency: &str) -> String {
    format!("BTC-{}", currency.to_ascii_uppercase())
}

/// Coinbase charges commission in the quote currency
pub fn fills_detail(fills: &[CoinbaseFill]) -> ExecutionDetail {
    ExecutionDetail::FillBased(
        fills
            .iter()
            .map(|fill| Fill {
                price: fill.price,
                qty: fill.base_size(),
                commission: fill.commission,
                commission_asset: FeeAsset::Quote,
            })
            .collect(),
    )
}

pub fn order_detail(order: &CoinbaseOrderSummary) -> ExecutionDetail {
    ExecutionDetail::OrderLevelOnly {
        executed_qty: order.filled_size,
        cumulative_quote: order.filled_value,
        quote_fee: order.total_fees,
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl<R: RestClient> Trading<R> {
    /// Fills when the venue has published them, else the order summary
    async fn execution(
        &self,
        order_id: &str,
        user_id: Option<&str>,
    ) -> Result<(ExecutionDetail, DateTime<Utc>), ExchangeError> {
        let fills = self.rest.list_fills(order_id, user_id).await?;
        if !fills.is_empty() {
            let executed_at = fills
                .iter()
                .filter_map(|fill| parse_time(&fill.trade_time))
                .max()
                .unwrap_or_else(Utc::now);
            return Ok((fills_detail(&fills), executed_at));
        }

        debug!(order_id, "no fills published yet, reading order summary");
        let order = self.rest.get_order(order_id, user_id).await?;
        let executed_at = parse_time(&order.created_time).unwrap_or_else(Utc::now);
        Ok((order_detail(&order), executed_at))
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    #[instrument(skip(self), fields(exchange = "coinbase"))]
    async fn execute_market_buy(
        &self,
        fiat_amount: Decimal,
        fee_percent_hint: Option<Decimal>,
        currency: &str,
        user_id: Option<&str>,
    ) -> Result<TradeResult, ExchangeError> {
        let currency = currency.to_ascii_uppercase();
        let product_id = product_for(&currency);

        let product = self.rest.get_product(&product_id, user_id).await?;
        let constraints =
            SizingConstraints::from_step_size(product.base_increment, product.quote_min_size)?;
        let spec = OrderSizer::size(
            self.flavor.exchange_id(),
            fiat_amount,
            &currency,
            product.price,
            constraints,
        )?;
        debug!(price = %product.price, base_size = %spec.quantity, ?fee_percent_hint, "placing market buy");

        let order_id = self
            .rest
            .create_market_buy(&product_id, &spec.quantity.to_string(), user_id)
            .await?;
        info!(%order_id, "market buy submitted");

        let (detail, executed_at) = self.execution(&order_id, user_id).await?;
        reduce_execution(order_id, &currency, &detail, executed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_fills_reduce_with_quote_commission() {
        let fills: Vec<CoinbaseFill> = serde_json::from_value(json!([
            {
                "trade_id": "t-1",
                "order_id": "o-1",
                "trade_time": "2024-03-01T10:00:00.120Z",
                "price": "60000",
                "size": "0.0004",
                "commission": "0.144",
                "size_in_quote": false
            },
            {
                "trade_id": "t-2",
                "order_id": "o-1",
                "trade_time": "2024-03-01T10:00:00.450Z",
                "price": "60010",
                "size": "0.0001",
                "commission": "0.036",
                "size_in_quote": false
            }
        ]))
        .unwrap();

        let detail = fills_detail(&fills);
        let result = reduce_execution("o-1", "EUR", &detail, Utc::now()).unwrap();
        assert_eq!(result.btc_amount, dec!(0.0005));
        assert_eq!(result.trading_fee, dec!(0.18));
        assert_eq!(result.fiat_spent, dec!(30.181));
    }

    #[test]
    fn test_product_id() {
        assert_eq!(product_for("usd"), "BTC-USD");
    }
}
