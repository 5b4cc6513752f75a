//! Quiver engine — turns an HTTP request into a GraphQL execution result.
//!
//! The engine is three pieces wired together by a dispatcher:
//!
//! - [`Pipeline`]: onion-model middleware composition. Stages run in
//!   registration order on the way in and reverse order on the way out,
//!   with a guarded, at-most-once continuation per stage.
//! - [`Context`]: the per-request state threaded through every stage —
//!   an `http` facet (inbound request, outbound status/headers/body), a
//!   `graphql` facet (query, document, variables, bound schema, resolver
//!   state), a `runtime` facet (environment bindings, host lifecycle
//!   handle), and a lazy side-channel map for middleware coordination.
//! - [`SchemaRegistry`]: ordered schema fragments merged into one
//!   executable graph on every registration.
//!
//! [`App`] is the facade: method check, context construction, content
//! negotiation, pipeline run with a terminal execute stage, and response
//! serialization. The engine performs no network I/O; runtime adapters
//! (see `quiver-axum`) bind [`App::fetch`] to a listening socket.

pub mod app;
pub mod compose;
pub mod context;
pub mod error;
pub mod middleware;
pub mod schema;

pub use app::App;
pub use compose::{Endpoint, Middleware, Next, Pipeline};
pub use context::{
    Context, Environment, GraphqlContext, HttpContext, Lifecycle, ResolverInfo, ResponseFormat,
    RuntimeContext, RuntimeKind,
};
pub use error::{ExecuteError, PipelineError, SchemaError};
pub use schema::{
    ExecutableSchema, Handler, HandlerResult, RootType, SchemaRegistry, SchemaSource,
};

pub use quiver_protocol::{GraphQLError, GraphQLPayload, ResponsePayload};
