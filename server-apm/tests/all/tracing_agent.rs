use http::StatusCode;
use server_apm::{
    config_notice_error_enabled, config_status_code_ignored, ApmMiddleware, ConfigOption,
    TracingAgent, ERROR_CAUSE_CHAIN, ERROR_MESSAGE, HTTP_HOST, HTTP_METHOD, HTTP_QUERY,
    HTTP_SCHEME, HTTP_STATUS_CODE, HTTP_TARGET, HTTP_USER_AGENT, OTEL_KIND, OTEL_NAME,
    OTEL_STATUS_CODE,
};
use server_middleware::{App, AppBuilder, Handler};

use crate::helpers::*;

fn traced<H: Handler>(handler: H, options: Vec<ConfigOption>) -> App {
    AppBuilder::new(handler)
        .with(ApmMiddleware::new(Some(TracingAgent::new()), options))
        .build()
}

fn only(spans: &CapturedSpans, name: &str) -> CapturedSpan {
    let mut named = spans.named(name);
    assert_eq!(named.len(), 1, "expected exactly one `{}` span", name);
    named.remove(0)
}

#[tokio::test]
async fn transaction_span_describes_the_request() {
    let (spans, _guard) = capture_spans();
    let app = traced(Respond(StatusCode::OK), vec![]);

    let req = http::Request::builder()
        .method("GET")
        .uri("/users/7?expand=orders")
        .header("host", "shop.example.com")
        .header("user-agent", "integration-test")
        .body(Default::default())
        .unwrap();
    app.call(req).await.unwrap();

    let span = only(&spans, "transaction");
    assert_eq!(span.field(OTEL_NAME), Some("GET /users/7"));
    assert_eq!(span.field(OTEL_KIND), Some("server"));
    assert_eq!(span.field(HTTP_METHOD), Some("GET"));
    assert_eq!(span.field(HTTP_SCHEME), Some("http"));
    assert_eq!(span.field(HTTP_HOST), Some("shop.example.com"));
    assert_eq!(span.field(HTTP_TARGET), Some("/users/7"));
    assert_eq!(span.field(HTTP_QUERY), Some("expand=orders"));
    assert_eq!(span.field(HTTP_USER_AGENT), Some("integration-test"));
    assert_eq!(span.field(HTTP_STATUS_CODE), Some("200"));
    assert_eq!(span.field(OTEL_STATUS_CODE), None);
    assert_eq!(span.field(ERROR_MESSAGE), None);
}

#[tokio::test]
async fn noticed_errors_mark_the_transaction_span() {
    let (spans, _guard) = capture_spans();
    let app = traced(
        FailWith(StatusCode::SERVICE_UNAVAILABLE),
        vec![config_notice_error_enabled(true)],
    );

    app.call(get("/checkout")).await.unwrap_err();

    let span = only(&spans, "transaction");
    assert_eq!(span.field(HTTP_STATUS_CODE), Some("503"));
    assert_eq!(span.field(OTEL_STATUS_CODE), Some("ERROR"));
    assert_eq!(
        span.field(ERROR_MESSAGE),
        Some("503 Service Unavailable: handler failed")
    );
    assert_eq!(
        span.field(ERROR_CAUSE_CHAIN),
        Some("503 Service Unavailable: handler failed")
    );
}

#[tokio::test]
async fn cause_chain_includes_error_sources() {
    let (spans, _guard) = capture_spans();
    let app = traced(FailOpaque, vec![config_notice_error_enabled(true)]);

    app.call(get("/")).await.unwrap_err();

    let span = only(&spans, "transaction");
    assert_eq!(span.field(HTTP_STATUS_CODE), Some("500"));
    assert_eq!(
        span.field(ERROR_MESSAGE),
        Some("Middleware error: database unreachable")
    );
    assert_eq!(
        span.field(ERROR_CAUSE_CHAIN),
        Some("Middleware error: database unreachable")
    );
}

#[tokio::test]
async fn ignored_client_errors_leave_the_span_status_unset() {
    let (spans, _guard) = capture_spans();
    let app = traced(
        FailWith(StatusCode::NOT_FOUND),
        vec![
            config_notice_error_enabled(true),
            config_status_code_ignored([404]),
        ],
    );

    app.call(get("/missing")).await.unwrap_err();

    let span = only(&spans, "transaction");
    assert_eq!(span.field(HTTP_STATUS_CODE), Some("404"));
    assert_eq!(span.field(OTEL_STATUS_CODE), None);
    assert_eq!(span.field(ERROR_MESSAGE), None);
}

#[tokio::test]
async fn segments_are_children_of_the_transaction_span() {
    let (spans, _guard) = capture_spans();
    let app = traced(WithSegment("load-user"), vec![]);

    app.call(get("/users/1")).await.unwrap();

    let transaction = only(&spans, "transaction");
    let segment = only(&spans, "segment");
    assert_eq!(segment.field(OTEL_NAME), Some("load-user"));
    assert_eq!(segment.parent, Some(transaction.id));
}

#[tokio::test]
async fn handler_spans_nest_under_the_transaction_span() {
    let (spans, _guard) = capture_spans();
    let app = traced(OpensSpan("db_query"), vec![]);

    app.call(get("/users/1")).await.unwrap();

    let transaction = only(&spans, "transaction");
    let work = only(&spans, "handler_work");
    assert_eq!(work.field("work"), Some("db_query"));
    assert_eq!(work.parent, Some(transaction.id));
}

#[tokio::test]
async fn connection_scheme_is_reported() {
    let (spans, _guard) = capture_spans();
    let app = traced(Respond(StatusCode::OK), vec![]);

    let mut req = get("/pay?x=1");
    req.headers_mut()
        .insert("host", http::HeaderValue::from_static("shop.example.com"));
    req.extensions_mut().insert(http::uri::Scheme::HTTPS);
    app.call(req).await.unwrap();

    let span = only(&spans, "transaction");
    assert_eq!(span.field(HTTP_SCHEME), Some("https"));
    assert_eq!(span.field(HTTP_HOST), Some("shop.example.com"));
}
