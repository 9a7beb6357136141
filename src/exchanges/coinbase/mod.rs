pub mod auth;
pub mod builder;
pub mod connector;
pub mod oauth;
pub mod rest;
pub mod signer;
pub mod types;

pub use auth::CoinbaseAuth;
pub use builder::{build_advanced_connector, build_oauth, build_retail_connector};
pub use connector::{CoinbaseConnector, CoinbaseFlavor};
pub use oauth::{CoinbaseOAuth, PkceChallenge};
pub use signer::{CdpSigner, CB_VERSION};
