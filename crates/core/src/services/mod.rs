pub mod auth_service;
pub mod exchange_rate_service;
pub mod mindmap_service;
pub mod stock_service;
pub mod valuation_service;
