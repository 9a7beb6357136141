//! Order sizing and execution reduction.
//!
//! Quantities are always rounded toward zero: a DCA buy may under-spend by a
//! fraction of a step but never exceeds the configured fiat amount.

use crate::core::errors::{ExchangeError, SizingError};
use crate::core::types::{ExchangeId, ExecutionDetail, FeeAsset, OrderSide, OrderSpec, TradeResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

/// Venue-reported quantity granularity and minimum order value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingConstraints {
    pub precision_digits: u32,
    pub min_notional: Decimal,
}

impl SizingConstraints {
    /// Constraints from a lot step size such as `0.00001000`
    pub fn from_step_size(step_size: Decimal, min_notional: Decimal) -> Result<Self, SizingError> {
        Ok(Self {
            precision_digits: precision_from_step(step_size)?,
            min_notional,
        })
    }

    /// Constraints from a venue that reports decimal places directly
    pub const fn from_decimals(precision_digits: u32, min_notional: Decimal) -> Self {
        Self {
            precision_digits,
            min_notional,
        }
    }
}

/// `round(|log10(step)|)`; steps of one or more mean whole units
/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_PLACES: u32 = 28;

pub fn precision_from_step(step_size: Decimal) -> Result<u32, SizingError> {
    if step_size <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "step size must be positive, got {}",
            step_size
        )));
    }
    if step_size >= Decimal::ONE {
        return Ok(0);
    }

    let step = step_size
        .to_f64()
        .ok_or_else(|| SizingError::InvalidInput(format!("step size {} out of range", step_size)))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let digits = step.log10().abs().round() as u32;
    Ok(digits.min(MAX_DECIMAL_PLACES))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderSizer;

impl OrderSizer {
    /// Size a market buy for `fiat_amount` at `price`.
    ///
    /// The minimum notional is checked twice, before rounding against the
    /// fiat amount and after rounding against `quantity * price`.
    pub fn size(
        exchange: ExchangeId,
        fiat_amount: Decimal,
        currency: &str,
        price: Decimal,
        constraints: SizingConstraints,
    ) -> Result<OrderSpec, SizingError> {
        if fiat_amount <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "amount must be positive, got {}",
                fiat_amount
            )));
        }
        if price <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "price must be positive, got {}",
                price
            )));
        }

        let SizingConstraints {
            precision_digits,
            min_notional,
        } = constraints;

        if fiat_amount < min_notional {
            return Err(SizingError::BelowMinimum {
                amount: fiat_amount,
                min_notional,
            });
        }

        let raw_quantity = fiat_amount / price;
        let quantity = raw_quantity.round_dp_with_strategy(precision_digits, RoundingStrategy::ToZero);
        let notional = quantity * price;

        if quantity.is_zero() || notional < min_notional {
            return Err(SizingError::BelowMinimumAfterRounding {
                notional,
                min_notional,
                precision: precision_digits,
            });
        }

        debug!(
            exchange = %exchange,
            %raw_quantity,
            %quantity,
            precision_digits,
            "sized order"
        );

        Ok(OrderSpec {
            exchange,
            fiat_amount,
            currency: currency.to_string(),
            side: OrderSide::Buy,
            quantity,
            precision_digits,
            min_notional,
        })
    }
}

/// Reduce a venue's execution report into one `TradeResult`.
///
/// Fill-based reports sum every fill: base-asset commissions reduce the net
/// BTC and form `trading_fee_btc`, quote-asset commissions are added to the
/// fiat fee and the amount spent. Order-level reports carry no BTC fee.
pub fn reduce_execution(
    order_id: impl Into<String>,
    currency: &str,
    detail: &ExecutionDetail,
    executed_at: DateTime<Utc>,
) -> Result<TradeResult, ExchangeError> {
    let order_id = order_id.into();

    let (gross_btc, gross_quote, fee_btc, fee_quote) = match detail {
        ExecutionDetail::FillBased(fills) => {
            let mut gross_btc = Decimal::ZERO;
            let mut gross_quote = Decimal::ZERO;
            let mut fee_btc = Decimal::ZERO;
            let mut fee_quote = Decimal::ZERO;

            for fill in fills {
                gross_btc += fill.qty;
                gross_quote += fill.price * fill.qty;
                match &fill.commission_asset {
                    FeeAsset::Base => fee_btc += fill.commission,
                    FeeAsset::Quote => fee_quote += fill.commission,
                    FeeAsset::Other(asset) => {
                        warn!(order_id = %order_id, %asset, commission = %fill.commission, "commission in unrelated asset not counted");
                    }
                }
            }
            (gross_btc, gross_quote, fee_btc, fee_quote)
        }
        ExecutionDetail::OrderLevelOnly {
            executed_qty,
            cumulative_quote,
            quote_fee,
        } => (*executed_qty, *cumulative_quote, Decimal::ZERO, *quote_fee),
    };

    if gross_btc <= Decimal::ZERO {
        return Err(ExchangeError::InvalidResponse(format!(
            "order {} reports no executed quantity",
            order_id
        )));
    }

    let avg_price = gross_quote / gross_btc;
    let trading_fee = fee_btc * avg_price + fee_quote;

    Ok(TradeResult {
        order_id,
        btc_amount: gross_btc - fee_btc,
        fiat_spent: gross_quote + fee_quote,
        currency: currency.to_string(),
        avg_price: avg_price.round_dp(8),
        trading_fee: trading_fee.round_dp(8),
        trading_fee_btc: fee_btc,
        timestamp: executed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Fill;
    use rust_decimal_macros::dec;

    fn sized(fiat: Decimal, price: Decimal, step: Decimal, min: Decimal) -> Result<OrderSpec, SizingError> {
        let constraints = SizingConstraints::from_step_size(step, min)?;
        OrderSizer::size(ExchangeId::Binance, fiat, "EUR", price, constraints)
    }

    #[test]
    fn test_precision_from_step() {
        assert_eq!(precision_from_step(dec!(0.00001000)).unwrap(), 5);
        assert_eq!(precision_from_step(dec!(0.1)).unwrap(), 1);
        assert_eq!(precision_from_step(dec!(1)).unwrap(), 0);
        assert_eq!(precision_from_step(dec!(0.00000001)).unwrap(), 8);
        assert_eq!(precision_from_step(Decimal::new(1, 28)).unwrap(), 28);
        assert!(precision_from_step(dec!(0)).is_err());
    }

    #[test]
    fn test_dca_sizing_rounds_down() {
        let spec = sized(dec!(35), dec!(58000), dec!(0.00001), dec!(5)).unwrap();
        assert_eq!(spec.quantity, dec!(0.00060));
        assert_eq!(spec.precision_digits, 5);
        assert_eq!(spec.quantity * dec!(58000), dec!(34.80));
        assert_eq!(spec.side, OrderSide::Buy);
    }

    #[test]
    fn test_below_minimum_rejected_before_rounding() {
        let err = sized(dec!(4), dec!(58000), dec!(0.00001), dec!(5)).unwrap_err();
        assert_eq!(
            err,
            SizingError::BelowMinimum {
                amount: dec!(4),
                min_notional: dec!(5)
            }
        );
    }

    #[test]
    fn test_rounding_can_push_below_minimum() {
        // 10.5 / 58000 = 0.000181.. -> 0.0001 at 4 digits -> 5.8 notional
        let err = sized(dec!(10.5), dec!(58000), dec!(0.0001), dec!(10)).unwrap_err();
        assert!(matches!(
            err,
            SizingError::BelowMinimumAfterRounding { precision: 4, .. }
        ));
    }

    #[test]
    fn test_sizing_never_overspends() {
        let prices = [dec!(58000), dec!(61234.57), dec!(0.37), dec!(99999.99), dec!(3)];
        let steps = [dec!(0.00001), dec!(0.001), dec!(0.1), dec!(1)];
        for fiat in [dec!(5), dec!(12.34), dec!(35), dec!(250), dec!(1000.01)] {
            for price in prices {
                for step in steps {
                    if let Ok(spec) = sized(fiat, price, step, Decimal::ZERO) {
                        assert!(spec.quantity * price <= fiat, "{} {} {}", fiat, price, step);
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_price_rejected() {
        assert!(matches!(
            sized(dec!(35), dec!(0), dec!(0.00001), dec!(5)),
            Err(SizingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fill_reduction_with_btc_commission() {
        let detail = ExecutionDetail::FillBased(vec![
            Fill {
                price: dec!(58000),
                qty: dec!(0.0004),
                commission: dec!(0.0000004),
                commission_asset: FeeAsset::Base,
            },
            Fill {
                price: dec!(58100),
                qty: dec!(0.0002),
                commission: dec!(0.0000002),
                commission_asset: FeeAsset::Base,
            },
        ]);
        let result = reduce_execution("42", "EUR", &detail, Utc::now()).unwrap();

        assert_eq!(result.trading_fee_btc, dec!(0.0000006));
        assert_eq!(result.btc_amount, dec!(0.0005994));
        assert_eq!(result.fiat_spent, dec!(34.82));
        assert_eq!(result.avg_price, dec!(58033.33333333));
        assert!(result.trading_fee > Decimal::ZERO);
    }

    #[test]
    fn test_quote_commission_only_affects_fiat_fee() {
        let detail = ExecutionDetail::FillBased(vec![Fill {
            price: dec!(50000),
            qty: dec!(0.001),
            commission: dec!(0.05),
            commission_asset: FeeAsset::Quote,
        }]);
        let result = reduce_execution("7", "EUR", &detail, Utc::now()).unwrap();

        assert_eq!(result.btc_amount, dec!(0.001));
        assert_eq!(result.trading_fee_btc, Decimal::ZERO);
        assert_eq!(result.trading_fee, dec!(0.05));
        assert_eq!(result.fiat_spent, dec!(50.05));
    }

    #[test]
    fn test_order_level_fallback_has_no_btc_fee() {
        let detail = ExecutionDetail::OrderLevelOnly {
            executed_qty: dec!(0.0006),
            cumulative_quote: dec!(34.8),
            quote_fee: Decimal::ZERO,
        };
        let result = reduce_execution("9", "USD", &detail, Utc::now()).unwrap();

        assert_eq!(result.btc_amount, dec!(0.0006));
        assert_eq!(result.avg_price, dec!(58000));
        assert_eq!(result.trading_fee_btc, Decimal::ZERO);
    }

    #[test]
    fn test_empty_execution_is_invalid() {
        let result = reduce_execution("1", "EUR", &ExecutionDetail::FillBased(vec![]), Utc::now());
        assert!(matches!(result, Err(ExchangeError::InvalidResponse(_))));
    }
}
