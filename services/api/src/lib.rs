//! services/api/src/lib.rs
//!
//! The document viewer service: store and processing adapters, the REST and
//! WebSocket surface, configuration and the service error type.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
