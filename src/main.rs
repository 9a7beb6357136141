use dcakit::core::sizing::{OrderSizer, SizingConstraints};
use dcakit::{ExchangeConfig, ExchangeFacade, ExchangeId, MemoryKeyStore};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    #[cfg(feature = "env-file")]
    let config = ExchangeConfig::from_env_file(".env")?;
    #[cfg(not(feature = "env-file"))]
    let config = ExchangeConfig::from_env()?;

    let facade = ExchangeFacade::new(&config, Arc::new(MemoryKeyStore::new()))?;

    let country = std::env::var("DCAKIT_COUNTRY").unwrap_or_else(|_| "DE".to_string());
    let available = facade
        .get_available_exchanges_for_user(&country)
        .data
        .unwrap_or_default();
    println!("Exchanges available in {}:", country);
    for exchange in &available {
        println!("  - {}", exchange.display_name());
    }

    // Sample sizing: 35 EUR at 58000 with a 0.00001 BTC step and a 5 EUR minimum
    let constraints = SizingConstraints::from_step_size(dec!(0.00001), dec!(5))?;
    match OrderSizer::size(ExchangeId::Binance, dec!(35), "EUR", dec!(58000), constraints) {
        Ok(spec) => println!(
            "35 EUR buys {} BTC ({} decimals)",
            spec.quantity, spec.precision_digits
        ),
        Err(e) => println!("Sizing rejected: {}", e),
    }

    let Some(exchange) = available.first().copied() else {
        return Ok(());
    };
    let fee = facade.get_withdrawal_fee(exchange, None, None, None).await;
    match (fee.data, fee.error) {
        (Some(fee), _) => println!("{} withdrawal fee estimate: {} BTC", exchange.display_name(), fee),
        (None, error) => println!("Fee estimate unavailable: {}", error.unwrap_or_default()),
    }

    Ok(())
}
