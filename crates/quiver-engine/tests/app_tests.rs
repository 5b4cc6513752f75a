//! Application-level tests — the full `fetch` path: method gating, content
//! negotiation, the client-error gates, execution, and middleware effects.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Method, Request, Response, StatusCode};
use quiver_engine::middleware::{Cors, Wallclock, WALLCLOCK_HEADER};
use quiver_engine::{
    App, Context, Handler, HandlerResult, Middleware, Next, PipelineError, RuntimeKind,
};
use serde_json::{json, Value};

const HELLO_SDL: &str = "type Query {\n  hello: String\n}";

fn hello<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async { Ok(json!("world")) })
}

fn hello_app() -> App {
    let mut app = App::new();
    app.handle(HELLO_SDL, hello).unwrap();
    app
}

fn request(method: Method, content_type: Option<&str>, uri: &str, body: &str) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    builder.body(Bytes::from(body.to_string())).unwrap()
}

fn post_json(body: Value) -> Request<Bytes> {
    request(
        Method::POST,
        Some("application/json"),
        "/graphql",
        &body.to_string(),
    )
}

fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Happy path and content negotiation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_json_query_executes() {
    let app = hello_app();
    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn named_operation_is_selected() {
    let app = hello_app();
    let response = app
        .fetch(
            post_json(json!({
                "query": "query A { hello }\nquery B { missing }",
                "operationName": "A",
            })),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn graphql_content_type_takes_body_as_query() {
    let app = hello_app();
    let response = app
        .fetch(
            request(Method::POST, Some("application/graphql"), "/graphql", "{ hello }"),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn form_body_is_decoded() {
    let app = hello_app();
    let response = app
        .fetch(
            request(
                Method::POST,
                Some("application/x-www-form-urlencoded"),
                "/graphql",
                "query=%7B%20hello%20%7D",
            ),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn get_reads_query_from_url() {
    let app = hello_app();
    let response = app
        .fetch(
            request(Method::GET, None, "/graphql?query=%7B%20hello%20%7D", ""),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn body_wins_over_query_string() {
    let app = hello_app();
    // The URL names an operation the document does not contain; the body's
    // operationName must take precedence.
    let response = app
        .fetch(
            request(
                Method::POST,
                Some("application/json"),
                "/graphql?operationName=Nope",
                &json!({"query": "query A { hello }", "operationName": "A"}).to_string(),
            ),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn aliases_key_the_result() {
    let app = hello_app();
    let response = app
        .fetch(post_json(json!({"query": "{ greeting: hello }"})), None, None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"greeting": "world"}}));
}

#[tokio::test]
async fn variables_reach_resolver_arguments() {
    fn echo<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            Ok(ctx.graphql.args.get("msg").cloned().unwrap_or(Value::Null))
        })
    }

    let mut app = App::new();
    app.handle("type Query {\n  echo(msg: String): String\n}", echo)
        .unwrap();

    let response = app
        .fetch(
            post_json(json!({
                "query": "query E($m: String) { echo(msg: $m) }",
                "variables": {"m": "hi"},
            })),
            None,
            None,
        )
        .await;

    assert_eq!(body_json(&response), json!({"data": {"echo": "hi"}}));
}

#[tokio::test]
async fn fragment_spread_is_flattened() {
    let app = hello_app();
    let response = app
        .fetch(
            post_json(json!({
                "query": "query Q { ...Roots }\nfragment Roots on Query { hello }",
            })),
            None,
            None,
        )
        .await;

    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn cyclic_fragment_spread_terminates() {
    let app = hello_app();
    // A fragment spreading itself must flatten once, not recurse forever.
    let response = app
        .fetch(
            post_json(json!({
                "query": "query Q { ...A }\nfragment A on Query { ...A hello }",
            })),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn mutually_recursive_fragments_terminate() {
    let app = hello_app();
    let response = app
        .fetch(
            post_json(json!({
                "query": "query Q { ...A }\n\
                          fragment A on Query { ...B }\n\
                          fragment B on Query { hello ...A }",
            })),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"data": {"hello": "world"}}));
}

// ─────────────────────────────────────────────────────────────────────────────
// Error gates
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_get_post_method_rejected() {
    let app = hello_app();
    let response = app
        .fetch(
            request(Method::PUT, Some("application/json"), "/graphql", "{}"),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        std::str::from_utf8(response.body()).unwrap(),
        "GraphQL only supports GET and POST requests."
    );
}

#[tokio::test]
async fn missing_query_is_client_error() {
    let app = hello_app();
    let response = app.fetch(post_json(json!({})), None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["message"], "Must provide query string");
    assert_eq!(body["errors"][0]["extensions"]["status"], 400);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn empty_registry_is_client_error() {
    let app = App::new();
    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["message"], "no schema registered yet");
}

#[tokio::test]
async fn malformed_body_rejected_before_middleware() {
    let mut app = hello_app();
    app.wrap(Wallclock);

    let response = app
        .fetch(
            request(Method::POST, Some("application/json"), "/graphql", "{not json"),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("GraphQL params error:"), "{message}");
    // Rejected pre-pipeline, so the timing stage never ran.
    assert!(!response.headers().contains_key(WALLCLOCK_HEADER));
}

#[tokio::test]
async fn unparseable_query_still_flows_through_middleware() {
    let mut app = hello_app();
    app.wrap(Wallclock);

    let response = app
        .fetch(post_json(json!({"query": "query {{{"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("could not generate document from query"), "{message}");
    assert!(message.contains("query {{{"), "{message}");
    // The gate lives in the terminal stage, downstream of the pipeline.
    assert!(response.headers().contains_key(WALLCLOCK_HEADER));
}

#[tokio::test]
async fn unknown_field_reported_in_errors() {
    let app = hello_app();
    let response = app
        .fetch(post_json(json!({"query": "{ missing }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(&response);
    assert_eq!(
        body["errors"][0]["message"],
        "cannot query field \"missing\" on type \"Query\""
    );
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn resolver_failure_collected_per_field() {
    fn fail<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async {
            Err(quiver_engine::GraphQLError::server("backing store offline"))
        })
    }

    let mut app = App::new();
    app.handle("type Query {\n  flaky: String\n}", fail).unwrap();

    let response = app
        .fetch(post_json(json!({"query": "{ flaky }"})), None, None)
        .await;

    // Field-level failures are execution results, not transport failures.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(&response);
    assert_eq!(body["data"], json!({"flaky": null}));
    assert_eq!(body["errors"][0]["message"], "backing store offline");
    assert_eq!(body["errors"][0]["extensions"]["status"], 500);
}

#[tokio::test]
async fn failing_middleware_becomes_server_error() {
    struct Boom;
    impl Middleware for Boom {
        fn handle<'a>(
            &'a self,
            _ctx: &'a mut Context,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async { Err(PipelineError::stage("boom")) })
        }
    }

    let mut app = hello_app();
    app.wrap(Boom);

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(&response);
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("middleware pipeline failed:"), "{message}");
    assert_eq!(body["errors"][0]["extensions"]["status"], 500);
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware and context effects
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn side_channel_reaches_resolvers() {
    struct Tag;
    impl Middleware for Tag {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                ctx.set("who", json!("middleware"));
                next.run(ctx).await
            })
        }
    }

    fn who<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move { Ok(ctx.get("who").cloned().unwrap_or(Value::Null)) })
    }

    let mut app = App::new();
    app.handle("type Query {\n  who: String\n}", who).unwrap();
    app.wrap(Tag);

    let response = app
        .fetch(post_json(json!({"query": "{ who }"})), None, None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"who": "middleware"}}));
}

#[tokio::test]
async fn wallclock_header_present_on_success() {
    let mut app = hello_app();
    app.wrap(Wallclock);

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let elapsed = response.headers()[WALLCLOCK_HEADER].to_str().unwrap();
    assert!(elapsed.parse::<u64>().is_ok(), "{elapsed}");
}

#[tokio::test]
async fn cors_headers_applied() {
    let mut app = hello_app();
    app.wrap(Cors::default());

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn short_circuit_middleware_can_answer_in_plain_text() {
    struct Teapot;
    impl Middleware for Teapot {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                ctx.http.status = Some(StatusCode::IM_A_TEAPOT);
                ctx.http.body = json!("short and stout");
                ctx.http.format = quiver_engine::ResponseFormat::Text;
                Ok(())
            })
        }
    }

    let mut app = hello_app();
    app.wrap(Teapot);

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(std::str::from_utf8(response.body()).unwrap(), "short and stout");
}

#[tokio::test]
async fn short_circuit_middleware_can_answer_in_html() {
    struct Page;
    impl Middleware for Page {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                ctx.http.body = json!("<h1>hello</h1>");
                ctx.http.format = quiver_engine::ResponseFormat::Html;
                Ok(())
            })
        }
    }

    let mut app = hello_app();
    app.wrap(Page);

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/html");
    assert_eq!(std::str::from_utf8(response.body()).unwrap(), "<h1>hello</h1>");
}

#[tokio::test]
async fn status_text_is_readable_by_upstream_middleware() {
    // Reason phrases are not representable in the wire response; an
    // upstream stage can still read the advisory text and surface it.
    struct Reason;
    impl Middleware for Reason {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                next.run(ctx).await?;
                if let Some(reason) = ctx.http.status_text.clone() {
                    if let Ok(value) = http::header::HeaderValue::from_str(&reason) {
                        ctx.http.headers.insert("x-status-reason", value);
                    }
                }
                Ok(())
            })
        }
    }

    struct Teapot;
    impl Middleware for Teapot {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                ctx.http.status = Some(StatusCode::IM_A_TEAPOT);
                ctx.http.status_text = Some("short and stout".into());
                ctx.http.body = json!(null);
                Ok(())
            })
        }
    }

    let mut app = hello_app();
    app.wrap(Reason);
    app.wrap(Teapot);

    let response = app
        .fetch(post_json(json!({"query": "{ hello }"})), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers()["x-status-reason"], "short and stout");
}

#[tokio::test]
async fn resolver_observes_runtime_kind() {
    fn runtime<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move { Ok(json!(ctx.runtime.kind.as_str())) })
    }

    let mut app = App::new();
    app.handle("type Query {\n  runtime: String\n}", runtime)
        .unwrap();
    app.set_runtime(RuntimeKind::Native);

    let response = app
        .fetch(post_json(json!({"query": "{ runtime }"})), None, None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"runtime": "native"}}));
}

#[tokio::test]
async fn resolver_info_describes_current_field() {
    fn inspect<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let info = ctx.graphql.info.as_ref().unwrap();
            Ok(json!({
                "field": info.field,
                "alias": info.alias,
                "rootType": info.root_type.type_name(),
            }))
        })
    }

    let mut app = App::new();
    app.handle("type Query {\n  inspect: String\n}", inspect)
        .unwrap();

    let response = app
        .fetch(post_json(json!({"query": "{ peek: inspect }"})), None, None)
        .await;

    assert_eq!(
        body_json(&response),
        json!({"data": {"peek": {
            "field": "inspect",
            "alias": "peek",
            "rootType": "Query",
        }}})
    );
}

#[tokio::test]
async fn environment_bindings_visible_to_resolvers() {
    fn binding<'a>(ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let value = ctx
                .runtime
                .env()
                .and_then(|env| env.get("GREETING").cloned())
                .unwrap_or(Value::Null);
            Ok(value)
        })
    }

    let mut app = App::new();
    app.handle("type Query {\n  binding: String\n}", binding)
        .unwrap();

    let env = Arc::new(quiver_engine::Environment::default().bind("GREETING", json!("hey")));
    let response = app
        .fetch(post_json(json!({"query": "{ binding }"})), Some(env), None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"binding": "hey"}}));
}

// ─────────────────────────────────────────────────────────────────────────────
// Multiple schema fragments
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fragments_merge_into_one_root() {
    fn bye<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(json!("later")) })
    }

    let mut app = hello_app();
    app.handle("type Query {\n  bye: String\n}", bye).unwrap();

    let response = app
        .fetch(post_json(json!({"query": "{ hello bye }"})), None, None)
        .await;

    assert_eq!(
        body_json(&response),
        json!({"data": {"hello": "world", "bye": "later"}})
    );
}

#[tokio::test]
async fn mutation_root_dispatches() {
    fn bump<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(json!(1)) })
    }

    let mut app = hello_app();
    app.handle("type Mutation {\n  bump: Int\n}", bump).unwrap();

    let response = app
        .fetch(post_json(json!({"query": "mutation { bump }"})), None, None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"bump": 1}}));
}

#[tokio::test]
async fn resolver_map_covers_multiple_fields() {
    fn a<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(json!("a")) })
    }
    fn b<'a>(_ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Ok(json!("b")) })
    }

    let mut resolvers: HashMap<String, Arc<dyn Handler>> = HashMap::new();
    resolvers.insert("a".into(), Arc::new(a));
    resolvers.insert("b".into(), Arc::new(b));

    let mut app = App::new();
    app.handle_each("type Query {\n  a: String\n  b: String\n}", resolvers)
        .unwrap();

    let response = app
        .fetch(post_json(json!({"query": "{ a b }"})), None, None)
        .await;

    assert_eq!(body_json(&response), json!({"data": {"a": "a", "b": "b"}}));
}
