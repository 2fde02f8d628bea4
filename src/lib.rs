//! Club Feed - publications feed for the club website
//!
//! This crate aggregates several RSS feeds (mostly Medium user feeds) into a
//! single, date-sorted JSON list served over HTTP.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod normalize;
pub mod routes;
pub mod source;
