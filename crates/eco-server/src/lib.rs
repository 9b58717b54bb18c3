//! Eco-routing HTTP service: provider clients, caches, orchestration and
//! the axum API.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod health;
pub mod providers;
pub mod state;
