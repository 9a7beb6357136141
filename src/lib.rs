pub mod core;
pub mod exchanges;
pub mod facade;
pub mod utils;

pub use core::{
    config::ExchangeConfig,
    credentials::{ExchangeKeys, KeyStore, MemoryKeyStore},
    errors::ExchangeError,
    traits::ExchangeAdapter,
    types::*,
};
pub use exchanges::binance::BinanceConnector;
pub use exchanges::coinbase::CoinbaseConnector;
pub use exchanges::kraken::KrakenConnector;
pub use facade::ExchangeFacade;
