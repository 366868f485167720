//! Local caching of the last fetched bookings.
//!
//! Cached data is stored as JSON with its fetch time and considered stale
//! after 60 minutes. The TUI shows it behind the login form while a fresh
//! copy is fetched.

pub mod manager;

pub use manager::{CacheManager, CachedData};
