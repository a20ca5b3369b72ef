//! Omok server library: HTTP/WebSocket transport over the `omok` engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
