pub mod registry;
pub mod traits;

// Stock data provider implementations
pub mod alpha_vantage;
pub mod kis;
pub mod local;

// Exchange rate provider implementations
pub mod exchange_rate_api;
pub mod frankfurter;
