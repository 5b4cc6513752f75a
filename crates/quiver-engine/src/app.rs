//! Application facade — validates the method, assembles the request
//! context, runs the middleware pipeline with the terminal execute stage,
//! and serializes the transport facet back to a response.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Method, Request, Response, StatusCode};
use serde_json::Value;

use quiver_protocol::{GraphQLError, ResponsePayload};

use crate::compose::{Endpoint, Middleware, Pipeline};
use crate::context::{Context, Environment, Lifecycle, RuntimeKind};
use crate::error::PipelineError;
use crate::schema::{self, ExecutableSchema, Handler, SchemaRegistry, SchemaSource};

/// The GraphQL application: a middleware list, a schema registry, and the
/// `fetch` contract runtime adapters bind to a socket.
///
/// Middleware and schemas are registered during setup; `fetch` takes
/// `&self` and may run concurrently once setup is done. Registration
/// concurrent with live traffic is not supported.
#[derive(Default)]
pub struct App {
    registry: SchemaRegistry,
    middleware: Vec<Arc<dyn Middleware>>,
    runtime_kind: RuntimeKind,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare which hosting runtime this app runs under. Called by the
    /// runtime adapter; requests observe the value via `ctx.runtime.kind`.
    pub fn set_runtime(&mut self, kind: RuntimeKind) {
        self.runtime_kind = kind;
    }

    /// Append a middleware stage; stages run in registration order.
    pub fn wrap(&mut self, middleware: impl Middleware + 'static) {
        tracing::debug!(stage = middleware.name(), "middleware registered");
        self.middleware.push(Arc::new(middleware));
    }

    /// Register a schema fragment (any of the three forms).
    pub fn register(&mut self, source: SchemaSource) -> Result<(), crate::error::SchemaError> {
        self.registry.register(source)
    }

    /// Register a prebuilt executable schema.
    pub fn schema(&mut self, schema: ExecutableSchema) -> Result<(), crate::error::SchemaError> {
        self.register(SchemaSource::Prebuilt(schema))
    }

    /// Register SDL text defining exactly one root field, resolved by
    /// `resolver`.
    pub fn handle(
        &mut self,
        sdl: impl Into<String>,
        resolver: impl Handler + 'static,
    ) -> Result<(), crate::error::SchemaError> {
        self.register(SchemaSource::TextWithResolver {
            sdl: sdl.into(),
            resolver: Arc::new(resolver),
        })
    }

    /// Register SDL text with a field-name → resolver mapping covering
    /// every root field.
    pub fn handle_each(
        &mut self,
        sdl: impl Into<String>,
        resolvers: HashMap<String, Arc<dyn Handler>>,
    ) -> Result<(), crate::error::SchemaError> {
        self.register(SchemaSource::TextWithResolverMap {
            sdl: sdl.into(),
            resolvers,
        })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Process one inbound request to completion.
    ///
    /// Sequence: method check → context construction → content negotiation
    /// → middleware pipeline with the terminal execute stage → response
    /// serialization. Nothing escapes this boundary uncaught: every failure
    /// becomes a structured response.
    pub async fn fetch(
        &self,
        request: Request<Bytes>,
        env: Option<Arc<Environment>>,
        lifecycle: Option<Arc<dyn Lifecycle>>,
    ) -> Response<Bytes> {
        if request.method() != Method::GET && request.method() != Method::POST {
            return plain_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "GraphQL only supports GET and POST requests.",
            );
        }

        let mut ctx = Context::new(request, env, lifecycle, self.runtime_kind);

        // Content negotiation. An undecodable body is rejected before any
        // user middleware runs.
        if let Err(err) = ctx.read_request() {
            tracing::debug!(%err, "malformed request body");
            set_error_payload(&mut ctx, GraphQLError::client(format!("GraphQL params error: {err}")));
            return ctx.into_response();
        }

        ctx.graphql.schema = self.registry.merged();

        let pipeline = Pipeline::new(self.middleware.clone());
        if let Err(err) = pipeline.run_with(&mut ctx, Some(&ExecuteStage)).await {
            tracing::error!(%err, "middleware pipeline failed");
            set_error_payload(
                &mut ctx,
                GraphQLError::server(format!("middleware pipeline failed: {err}")),
            );
        }

        ctx.into_response()
    }
}

/// Terminal pipeline stage: the three client-error gates, then execution.
/// Runs after all user middleware has proceeded, so those error paths still
/// observe middleware side effects.
struct ExecuteStage;

impl Endpoint for ExecuteStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            let Some(query) = ctx.graphql.query.clone() else {
                set_error_payload(ctx, GraphQLError::client("Must provide query string"));
                return Ok(());
            };
            let Some(document) = ctx.graphql.document.clone() else {
                set_error_payload(
                    ctx,
                    GraphQLError::client(format!(
                        "could not generate document from query: {query}"
                    )),
                );
                return Ok(());
            };
            let Some(schema) = ctx.graphql.schema.clone() else {
                set_error_payload(ctx, GraphQLError::client("no schema registered yet"));
                return Ok(());
            };

            match schema::execute(schema, document, ctx).await {
                Ok(result) => {
                    ctx.http.status = Some(StatusCode::OK);
                    ctx.http.body = payload_value(&result);
                }
                Err(err) => {
                    tracing::error!(%err, "execution failed");
                    set_error_payload(
                        ctx,
                        GraphQLError::server(format!("GraphQL execution error: {err}")),
                    );
                }
            }
            Ok(())
        })
    }
}

/// Write an error payload and its status onto the transport facet.
fn set_error_payload(ctx: &mut Context, error: GraphQLError) {
    ctx.http.status = StatusCode::from_u16(error.status()).ok();
    ctx.http.body = payload_value(&ResponsePayload::error(error));
}

fn payload_value(payload: &ResponsePayload) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

fn plain_response(status: StatusCode, body: &str) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::header::HeaderValue::from_static("text/plain"),
    );
    response
}
