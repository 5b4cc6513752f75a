//! Quiver — GraphQL-over-HTTP server
//!
//! A demo binary wiring the engine to the native tokio/axum adapter: a
//! small schema assembled from independent fragments, wallclock timing and
//! CORS middleware, and a listener that serves GraphQL on `/graphql`.
//!
//! Usage:
//!   quiver                      # Default port 4000
//!   quiver --port 8080          # Custom port
//!   quiver --verbose            # Debug logging

use clap::Parser;
use futures_util::future::BoxFuture;
use quiver_engine::middleware::{Cors, Wallclock};
use quiver_engine::{App, Context, HandlerResult};
use quiver_axum::{GraphQLServer, ServerConfig};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quiver", about = "Quiver GraphQL server")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, default_value = "4000")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn hello<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async { Ok(json!("world")) })
}

fn echo<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async move {
        Ok(ctx.graphql.args.get("message").cloned().unwrap_or(Value::Null))
    })
}

fn runtime<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async move { Ok(json!(ctx.runtime.kind.as_str())) })
}

fn build_app() -> anyhow::Result<App> {
    let mut app = App::new();
    app.handle("type Query {\n  hello: String\n}", hello)?;
    app.handle("type Query {\n  echo(message: String): String\n}", echo)?;
    app.handle("type Query {\n  runtime: String\n}", runtime)?;
    app.wrap(Wallclock);
    app.wrap(Cors::default());
    Ok(app)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = build_app()?;

    let config = ServerConfig {
        port: cli.port,
        hostname: cli.hostname,
    };
    let mut server = GraphQLServer::start(config, app).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.stop().await;

    Ok(())
}
