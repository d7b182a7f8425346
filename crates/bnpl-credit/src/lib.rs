//! Credit entitlement engine and assessment workflow for buy-now-pay-later offers.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
