//! HTTP adapters for the session and balance backends.

mod balance_api;
mod client;
mod session_api;

pub use balance_api::HttpBalanceService;
pub use client::ApiClient;
pub use session_api::HttpSessionService;
