//! Application performance monitoring middleware for [`server_middleware`].
//!
//! Attach [`ApmMiddleware`] to your app to report every request to a monitoring agent as a
//! transaction. The middleware names the transaction, describes the inbound request to the
//! agent, reports errors returned by the rest of the chain and records the final status code.
//! Errors are passed back to the caller untouched.
//!
//! Any monitoring backend can be plugged in by implementing [`Agent`]. With the default
//! `tracing-agent` feature, [`TracingAgent`] reports transactions as `tracing` spans.
//!
//! ```rust
//! use http::Extensions;
//! use server_apm::{
//!     config_notice_error_enabled, config_status_code_ignored, segment, ApmMiddleware,
//!     TracingAgent,
//! };
//! use server_middleware::{AppBuilder, Handler, Request, Response, Result};
//!
//! struct LoadUser;
//!
//! #[async_trait::async_trait]
//! impl Handler for LoadUser {
//!     async fn call(&self, _req: Request, extensions: &mut Extensions) -> Result<Response> {
//!         segment::send(extensions, "load-user");
//!         Ok(Response::new("{\"id\":1}".into()))
//!     }
//! }
//!
//! let app = AppBuilder::new(LoadUser)
//!     .with(ApmMiddleware::new(
//!         Some(TracingAgent::new()),
//!         [
//!             config_notice_error_enabled(true),
//!             config_status_code_ignored([401, 404]),
//!         ],
//!     ))
//!     .build();
//! ```
//!
//! Handlers further down the chain can reach the request's transaction with
//! [`segment::from_extensions`].

mod agent;
mod config;
mod known_paths;
mod middleware;
pub mod segment;
#[cfg(feature = "tracing-agent")]
mod tracing_agent;
mod web_request;

pub use agent::{
    Agent, CurrentTransaction, NoopSegment, NoopTransaction, Segment, Transaction, WebResponse,
};
pub use config::{
    config_custom_transaction_name_func, config_notice_error_enabled, config_status_code_ignored,
    default_transaction_name, ConfigKey, ConfigMap, ConfigOption, ConfigValue, TransactionName,
    TransactionNameFn,
};
pub use known_paths::KnownPaths;
pub use middleware::ApmMiddleware;
pub use web_request::{WebRequest, WebUrl};

#[cfg(feature = "tracing-agent")]
pub use tracing_agent::{
    TracingAgent, TracingTransaction, ERROR_CAUSE_CHAIN, ERROR_MESSAGE, HTTP_HOST, HTTP_METHOD,
    HTTP_QUERY, HTTP_SCHEME, HTTP_STATUS_CODE, HTTP_TARGET, HTTP_USER_AGENT, OTEL_KIND, OTEL_NAME,
    OTEL_STATUS_CODE,
};
