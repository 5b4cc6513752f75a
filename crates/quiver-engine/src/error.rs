//! Engine error types.
//!
//! Three concerns, three enums: [`PipelineError`] for middleware
//! composition failures, [`SchemaError`] for registration-time failures
//! (these never reach a request), and [`ExecuteError`] for failures surfaced
//! while dispatching root fields. Wire-visible errors are a separate thing —
//! see `quiver_protocol::GraphQLError`.

use crate::schema::RootType;

/// Failure inside a running middleware pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage invoked its continuation more than once.
    #[error("proceed() invoked multiple times within one middleware stage")]
    MultipleProceed,

    /// A stage failed with its own error.
    #[error("middleware stage failed: {0}")]
    Stage(Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    pub fn stage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Stage(err.into())
    }
}

/// Registration-time schema failure — always fatal at setup.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema parse error: {0}")]
    Parse(String),

    /// Single-resolver registration requires the schema text to define
    /// exactly one field across Query, Mutation, and Subscription.
    #[error("only one root operation field is allowed for single-resolver registration (found {found})")]
    SingleRootField { found: usize },

    #[error("no resolver function for {type_name}.{field}")]
    MissingResolver { type_name: String, field: String },

    #[error("cannot bind resolver: unknown field {root}.{field}")]
    UnknownField { root: RootType, field: String },

    #[error("duplicate type name across schema fragments: {0}")]
    DuplicateType(String),

    #[error("conflicting root field {type_name}.{field} across schema fragments")]
    DuplicateField { type_name: String, field: String },

    /// A prebuilt schema failed structural validation; every violation is
    /// listed so the caller sees them all at once.
    #[error("invalid schema: {}", violations.join("; "))]
    Invalid { violations: Vec<String> },
}

/// Execution-time failure that is not attributable to a single field.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The merged schema knows the field but carries no resolver for it.
    #[error("no resolver bound for field {type_name}.{field}")]
    UnboundField { type_name: String, field: String },
}
