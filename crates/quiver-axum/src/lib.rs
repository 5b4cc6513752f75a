//! Native runtime adapter — binds a quiver [`App`](quiver_engine::App) to a
//! tokio TCP listener through axum.
//!
//! The engine is transport-agnostic: it exposes `App::fetch` over plain
//! `http` request/response types and performs no I/O of its own. This crate
//! supplies the native half: an axum router that buffers the inbound body,
//! invokes `fetch`, and streams the response back, plus a tokio-backed
//! [`Lifecycle`](quiver_engine::Lifecycle) for background work.

pub mod lifecycle;
pub mod server;

pub use lifecycle::TokioLifecycle;
pub use server::{GraphQLServer, ServerConfig, ServerError, serve};
