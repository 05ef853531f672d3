//! booklist - daily novel ranking acquisition and query service.
//!
//! Pulls ranking lists from several Chinese web-novel sites once a day,
//! normalizes them into one canonical schema, and serves them over a small
//! JSON API that falls back to the latest stored date.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod server;
pub mod services;
