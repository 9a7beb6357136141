pub mod builder;
pub mod connector;
pub mod rest;
pub mod signer;
pub mod types;

pub use builder::build_connector;
pub use connector::KrakenConnector;
pub use signer::KrakenSigner;
pub use types::{normalize_asset, KrakenAssetPair, KrakenBalanceEx, KrakenOrder, KrakenResponse};
