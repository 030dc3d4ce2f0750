//! Listening socket and connection spawning.

pub mod listener;

pub use listener::Server;
