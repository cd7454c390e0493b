use std::error::Error as StdError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::StatusCode;
use tracing::field::Empty;
use tracing::Span;

use crate::agent::{Agent, NoopSegment, Segment, Transaction, WebResponse};
use crate::web_request::WebRequest;

/// The `otel.name` field added to transaction and segment spans
pub const OTEL_NAME: &str = "otel.name";
/// The `otel.kind` field added to transaction spans
pub const OTEL_KIND: &str = "otel.kind";
/// The `otel.status_code` field added to transaction spans
pub const OTEL_STATUS_CODE: &str = "otel.status_code";
/// The `http.method` field added to transaction spans
pub const HTTP_METHOD: &str = "http.method";
/// The `http.scheme` field added to transaction spans
pub const HTTP_SCHEME: &str = "http.scheme";
/// The `http.host` field added to transaction spans
pub const HTTP_HOST: &str = "http.host";
/// The `http.target` field added to transaction spans
pub const HTTP_TARGET: &str = "http.target";
/// The `http.query` field added to transaction spans
pub const HTTP_QUERY: &str = "http.query";
/// The `http.user_agent` field added to transaction spans
pub const HTTP_USER_AGENT: &str = "http.user_agent";
/// The `http.status_code` field added to transaction spans
pub const HTTP_STATUS_CODE: &str = "http.status_code";
/// The `error.message` field added to transaction spans
pub const ERROR_MESSAGE: &str = "error.message";
/// The `error.cause_chain` field added to transaction spans
pub const ERROR_CAUSE_CHAIN: &str = "error.cause_chain";

/// An [`Agent`] that reports transactions as `tracing` spans.
///
/// Each transaction is an `INFO` span named `transaction`, segments are child spans named
/// `segment`. Pair it with `tracing-opentelemetry` to export transactions as server spans; the
/// `otel.*` fields follow that crate's conventions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAgent;

impl TracingAgent {
    pub fn new() -> Self {
        TracingAgent
    }
}

impl Agent for TracingAgent {
    fn start_transaction(&self, name: &str) -> Arc<dyn Transaction> {
        let span = tracing::info_span!(
            "transaction",
            otel.name = %name,
            otel.kind = "server",
            otel.status_code = Empty,
            http.method = Empty,
            http.scheme = Empty,
            http.host = Empty,
            http.target = Empty,
            http.query = Empty,
            http.user_agent = Empty,
            http.status_code = Empty,
            error.message = Empty,
            error.cause_chain = Empty,
        );

        Arc::new(TracingTransaction {
            span: Mutex::new(Some(span)),
        })
    }
}

/// A transaction backed by a [`Span`]. The span closes on [`Transaction::end`].
#[derive(Debug)]
pub struct TracingTransaction {
    span: Mutex<Option<Span>>,
}

impl TracingTransaction {
    fn span(&self) -> MutexGuard<'_, Option<Span>> {
        self.span.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_span(&self, f: impl FnOnce(&Span)) {
        if let Some(span) = self.span().as_ref() {
            f(span);
        }
    }
}

impl Transaction for TracingTransaction {
    fn set_web_request(&self, request: &WebRequest) {
        self.with_span(|span| {
            span.record(HTTP_METHOD, request.method.as_str());
            span.record(HTTP_SCHEME, request.url.scheme.as_str());
            span.record(HTTP_HOST, request.url.host.as_str());
            span.record(HTTP_TARGET, request.url.path.as_str());
            if !request.url.raw_query.is_empty() {
                span.record(HTTP_QUERY, request.url.raw_query.as_str());
            }
            if let Some(user_agent) = request.user_agent() {
                span.record(HTTP_USER_AGENT, user_agent);
            }
        });
    }

    fn set_web_response(&self, _response: WebResponse) {}

    fn write_header(&self, status: StatusCode) {
        self.with_span(|span| {
            span.record(HTTP_STATUS_CODE, status.as_u16() as i64);
            if let Some(span_status) = get_span_status(status) {
                span.record(OTEL_STATUS_CODE, span_status);
            }
        });
    }

    fn notice_error(&self, error: &(dyn StdError + 'static)) {
        self.with_span(|span| {
            span.record(OTEL_STATUS_CODE, "ERROR");
            span.record(ERROR_MESSAGE, error.to_string().as_str());
            span.record(ERROR_CAUSE_CHAIN, cause_chain(error).as_str());
        });
    }

    fn start_segment(&self, name: &str) -> Box<dyn Segment> {
        match self.span().as_ref() {
            Some(span) => Box::new(TracingSegment(tracing::info_span!(
                parent: span,
                "segment",
                otel.name = %name,
            ))),
            None => Box::new(NoopSegment),
        }
    }

    fn tracing_span(&self) -> Option<Span> {
        self.span().clone()
    }

    fn end(&self) {
        // Dropping the last handle closes the span.
        let _ = self.span().take();
    }
}

struct TracingSegment(Span);

impl Segment for TracingSegment {
    fn end(self: Box<Self>) {}
}

/// HTTP Mapping <https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/trace/semantic_conventions/http.md#status>
///
/// Maps the the http status to an Opentelemetry span status for a server span.
fn get_span_status(status: StatusCode) -> Option<&'static str> {
    match status.as_u16() {
        // Span Status MUST be left unset if HTTP status code was in the 1xx, 2xx or 3xx ranges.
        100..=399 => None,
        // For HTTP status codes in the 4xx range span status MUST be left unset in case of
        // SpanKind.SERVER.
        400..=499 => None,
        // For HTTP status codes in the 5xx range, as well as any other code the server failed
        // to interpret, span status MUST be set to Error.
        _ => Some("ERROR"),
    }
}

/// Joins the messages of `error` and its sources. A source whose message already ends the
/// previous one, as with `#[error("...: {0}")]` wrappers, is not repeated.
fn cause_chain(error: &(dyn StdError + 'static)) -> String {
    let mut chain: Vec<String> = Vec::new();
    for message in std::iter::successors(Some(error), |&e| e.source()).map(|e| e.to_string()) {
        if chain.last().map_or(false, |last| last.ends_with(&message)) {
            continue;
        }
        chain.push(message);
    }
    chain.join(": ")
}
