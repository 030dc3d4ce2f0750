//! staticd - static file HTTP server
//!
//! Core library: configuration, the HTTP/1.x engine and the acceptor.

pub mod config;
pub mod http;
pub mod server;
