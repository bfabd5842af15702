//! In-memory caches owned by the application.

mod balance_cache;

pub use balance_cache::{BalanceCache, CachedBalance, CachedBalanceService};
