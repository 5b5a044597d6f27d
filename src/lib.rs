//! PQR News - a regional press RSS aggregator
//!
//! This crate collects articles from the RSS feeds of the French regional
//! daily press, stores them in SQLite and serves both a JSON API and an
//! htmx-driven web interface grouped by region.

pub mod api;
pub mod collector;
pub mod config;
pub mod db;
pub mod routes;
