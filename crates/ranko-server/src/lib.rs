//! ranko-server: the HTTP surface over the ranking engine.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod server;
pub mod state;
