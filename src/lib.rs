//! Property-listing XML feed exporter.
//!
//! `parse` mode pages eligible listings out of the store per category,
//! transforms each row into an advertisement record, and appends the
//! records to per-category XML feed files. `test` mode re-opens the
//! generated feeds and checks every listing URL over HTTP.

pub mod advert;
pub mod category;
pub mod config;
pub mod export;
pub mod storage;
pub mod validator;
