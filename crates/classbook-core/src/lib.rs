//! Core library for Classbook.
//!
//! Everything that does not depend on a particular user interface lives here:
//!
//! - `auth`: credential resolution, session bootstrap, persisted token stores
//! - `api`: the studio REST client and its error types
//! - `models`: bookings and identity claims
//! - `cache`: on-disk cache of the last fetched bookings
//! - `config`: user configuration
//! - `utils`: formatting helpers shared by the frontends

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;
