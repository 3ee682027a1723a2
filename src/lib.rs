//! Rotary - Round-robin TCP load balancer
//!
//! Core library for backend selection, byte relaying and the accept loop.

pub mod config;
pub mod proxy;
pub mod server;
