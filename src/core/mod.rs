pub mod config;
pub mod credentials;
pub mod errors;
pub mod geo;
pub mod kernel;
pub mod signing;
pub mod sizing;
pub mod traits;
pub mod types;
