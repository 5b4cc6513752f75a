//! Quiver GraphQL wire types.
//!
//! The shapes a GraphQL-over-HTTP endpoint reads and writes: the inbound
//! request payload (`{query, operationName, variables, extensions}`), the
//! outbound response payload (`{data, errors}`), and the structured error
//! object carrying an HTTP status under `extensions.status`. This crate is
//! the single source of truth for those shapes; it knows nothing about
//! middleware, schemas, or transports.

pub mod error;
pub mod payload;

pub use error::{GraphQLError, PayloadError};
pub use payload::{GraphQLPayload, ResponsePayload};
