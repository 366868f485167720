//! Data models for studio entities.
//!
//! - `Booking`, `StudioClass`: a reserved class and its schedule, coach and studio
//! - `IdTokenClaims`, `Member`: identity of the logged-in member

pub mod booking;
pub mod member;

pub use booking::{sort_by_start, Booking, Coach, Studio, StudioClass, BOOKING_COLUMNS};
pub use member::{IdTokenClaims, Member};
