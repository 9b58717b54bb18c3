//! Eco-routing CLI: an HTTP client for the routing service and plain-text
//! rendering of its responses.

pub mod client;
pub mod report;

pub use client::EcoClient;
