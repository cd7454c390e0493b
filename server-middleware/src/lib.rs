//! This crate provides [`App`], a request [`Handler`] wrapped in a chain of middleware which runs
//! on every inbound request.
//!
//! You'll want to instantiate [`App`] using [`AppBuilder`], then you can attach your middleware
//! using [`with`], finalize it with [`build`] and from then on feed it requests from whatever
//! server you run it behind:
//!
//! ```
//! use http::Extensions;
//! use server_middleware::{handler_fn, AppBuilder, Middleware, Next, Request, Response, Result};
//!
//! struct LoggingMiddleware;
//!
//! #[async_trait::async_trait]
//! impl Middleware for LoggingMiddleware {
//!     async fn handle(
//!         &self,
//!         req: Request,
//!         extensions: &mut Extensions,
//!         next: Next<'_>,
//!     ) -> Result<Response> {
//!         println!("Request started {:?}", req);
//!         let res = next.run(req, extensions).await;
//!         println!("Result: {:?}", res);
//!         res
//!     }
//! }
//!
//! async fn hello(_req: Request) -> Result<Response> {
//!     Ok(Response::new("hello".into()))
//! }
//!
//! async fn run(req: Request) {
//!     let app = AppBuilder::new(handler_fn(hello))
//!         .with(LoggingMiddleware)
//!         .build();
//!     let res = app.respond(req).await;
//!     println!("Status: {}", res.status());
//! }
//! ```
//!
//! [`build`]: AppBuilder::build
//! [`with`]: AppBuilder::with
mod app;
mod error;
mod handler;
mod middleware;
mod req_init;
mod request;

pub use app::{App, AppBuilder};
pub use error::{Error, Result};
pub use handler::{handler_fn, Handler, HandlerFn};
pub use middleware::{BoxFuture, Middleware, Next};
pub use req_init::{Extension, RequestInitialiser};
pub use request::RequestExt;

/// An inbound request as seen by middleware and handlers.
pub type Request = http::Request<bytes::Bytes>;

/// The response produced by a handler.
pub type Response = http::Response<bytes::Bytes>;
