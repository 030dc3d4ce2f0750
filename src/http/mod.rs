//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.0 and HTTP/1.1 subset: `GET` only, no request
//! bodies, pipelining and keep-alive supported.
//!
//! # Architecture
//!
//! - **`connection`**: per-client worker owning the socket, buffers and idle timer
//! - **`parser`**: splits inbound bytes into pipelined requests
//! - **`request`**: the parsed request record
//! - **`dispatcher`**: decides each request's status and resolves files
//! - **`response`**: status codes and the exact response texts
//! - **`writer`**: appends responses and streams file bodies to the client
//! - **`timer`**: single-shot idle timer
//! - **`mime`**: extension extraction and the default content-type table
//!
//! # Connection lifecycle
//!
//! ```text
//!        ┌─────────────┐
//!        │   Waiting   │ ← idle timer armed, socket read pending
//!        └──────┬──────┘
//!               │ bytes arrive (timer disarmed)
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsing      │ ← zero or more complete requests
//!        └──────┬───────────┘
//!               │ batch, in arrival order
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← one response per request, then flush
//!        └──────┬───────────┘
//!               │ last request of the batch decides
//!               ├─ Keep-Alive → Waiting (timer rearmed)
//!               └─ Close → Closed
//! ```
//!
//! EOF, a reset, or the idle timer firing in `Waiting` also lead to `Closed`.

pub mod connection;
pub mod dispatcher;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod timer;
pub mod writer;
