//! Schema registration and execution.
//!
//! [`SchemaRegistry`] accumulates fragments — prebuilt [`ExecutableSchema`]s
//! or SDL text with resolver bindings — and re-derives one merged executable
//! graph on every registration. [`execute`] dispatches a parsed document's
//! root fields against the merged graph.

pub mod exec;
pub mod executable;
pub mod registry;

use futures_util::future::BoxFuture;
use serde_json::Value;

use quiver_protocol::GraphQLError;

use crate::context::Context;

pub use exec::execute;
pub use executable::ExecutableSchema;
pub use registry::{SchemaRegistry, SchemaSource};

/// The fixed set of root operation types a registry recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RootType {
    Query,
    Mutation,
    Subscription,
}

impl RootType {
    pub const ALL: [RootType; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// The object type name this root is recognized by in SDL text.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Query" => Some(Self::Query),
            "Mutation" => Some(Self::Mutation),
            "Subscription" => Some(Self::Subscription),
            _ => None,
        }
    }
}

impl std::fmt::Display for RootType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// What a resolver returns: a field value, or a structured GraphQL error
/// collected into the response's `errors` array.
pub type HandlerResult = Result<Value, GraphQLError>;

/// A resolver function invoked with the request context as sole argument.
///
/// The executor copies the parent value, coerced field arguments, and
/// execution info into `ctx.graphql` immediately before each call, so the
/// resolver reads its call frame off the context.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self)(ctx)
    }
}
