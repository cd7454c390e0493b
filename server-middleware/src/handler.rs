use http::Extensions;
use std::future::Future;

use crate::error::Result;
use crate::middleware::BoxFuture;
use crate::{Request, Response};

/// The endpoint at the end of a middleware chain.
///
/// A handler receives the request once every middleware attached to the [`App`] has run, along
/// with the same `extensions` the middleware saw.
///
/// # Example
///
/// ```
/// use http::Extensions;
/// use server_middleware::{Handler, Request, Response, Result};
///
/// struct Hello;
///
/// #[async_trait::async_trait]
/// impl Handler for Hello {
///     async fn call(&self, _req: Request, _extensions: &mut Extensions) -> Result<Response> {
///         Ok(Response::new("hello".into()))
///     }
/// }
/// ```
///
/// [`App`]: crate::App
#[async_trait::async_trait]
pub trait Handler: 'static + Send + Sync {
    async fn call(&self, req: Request, extensions: &mut Extensions) -> Result<Response>;
}

#[async_trait::async_trait]
impl<F> Handler for F
where
    F: Send
        + Sync
        + 'static
        + for<'a> Fn(Request, &'a mut Extensions) -> BoxFuture<'a, Result<Response>>,
{
    async fn call(&self, req: Request, extensions: &mut Extensions) -> Result<Response> {
        (self)(req, extensions).await
    }
}

/// Wraps an async function that only needs the request.
///
/// ```
/// use server_middleware::{handler_fn, AppBuilder, Request, Response, Result};
///
/// async fn hello(_req: Request) -> Result<Response> {
///     Ok(Response::new("hello".into()))
/// }
///
/// let app = AppBuilder::new(handler_fn(hello)).build();
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    HandlerFn(f)
}

/// A [`Handler`] built with [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F>(F);

#[async_trait::async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn call(&self, req: Request, _extensions: &mut Extensions) -> Result<Response> {
        (self.0)(req).await
    }
}
