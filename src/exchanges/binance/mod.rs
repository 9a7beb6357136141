pub mod builder;
pub mod connector;
pub mod rest;
pub mod signer;
pub mod types;

pub use builder::build_connector;
pub use connector::BinanceConnector;
pub use signer::BinanceSigner;
pub use types::{
    BinanceAccountInfo, BinanceBalance, BinanceCoinConfig, BinanceExchangeInfo, BinanceFill,
    BinanceFilter, BinanceMarket, BinanceOrderResponse,
};
