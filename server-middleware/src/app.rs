use http::Extensions;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::handler::Handler;
use crate::middleware::{Middleware, Next};
use crate::{Request, RequestInitialiser, Response};

/// An `AppBuilder` is used to build an [`App`].
///
/// [`App`]: crate::App
pub struct AppBuilder {
    handler: Arc<dyn Handler>,
    middleware_stack: Vec<Arc<dyn Middleware>>,
    initialiser_stack: Vec<Arc<dyn RequestInitialiser>>,
}

impl AppBuilder {
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler,
    {
        AppBuilder {
            handler: Arc::new(handler),
            middleware_stack: Vec::new(),
            initialiser_stack: Vec::new(),
        }
    }

    /// This method allows creating an AppBuilder from an existing App instance
    pub fn from_app(app: App) -> Self {
        Self {
            handler: app.handler,
            middleware_stack: app.middleware_stack.into_vec(),
            initialiser_stack: app.initialiser_stack.into_vec(),
        }
    }

    /// Convenience method to attach middleware.
    ///
    /// If you need to keep a reference to the middleware after attaching, use [`with_arc`].
    ///
    /// [`with_arc`]: Self::with_arc
    pub fn with<M>(self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.with_arc(Arc::new(middleware))
    }

    /// Add middleware to the chain. [`with`] is more ergonomic if you don't need the `Arc`.
    ///
    /// [`with`]: Self::with
    pub fn with_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_stack.push(middleware);
        self
    }

    /// Convenience method to attach a request initialiser.
    ///
    /// If you need to keep a reference to the initialiser after attaching, use [`with_arc_init`].
    ///
    /// [`with_arc_init`]: Self::with_arc_init
    pub fn with_init<I>(self, initialiser: I) -> Self
    where
        I: RequestInitialiser,
    {
        self.with_arc_init(Arc::new(initialiser))
    }

    /// Add a request initialiser to the chain. [`with_init`] is more ergonomic if you don't need the `Arc`.
    ///
    /// [`with_init`]: Self::with_init
    pub fn with_arc_init(mut self, initialiser: Arc<dyn RequestInitialiser>) -> Self {
        self.initialiser_stack.push(initialiser);
        self
    }

    /// Returns an `App` using this builder configuration.
    pub fn build(self) -> App {
        App {
            handler: self.handler,
            middleware_stack: self.middleware_stack.into_boxed_slice(),
            initialiser_stack: self.initialiser_stack.into_boxed_slice(),
        }
    }
}

/// `App` is a [`Handler`] wrapped in a middleware chain. Cloning is cheap; every clone shares
/// the same handler and middleware.
#[derive(Clone)]
pub struct App {
    handler: Arc<dyn Handler>,
    middleware_stack: Box<[Arc<dyn Middleware>]>,
    initialiser_stack: Box<[Arc<dyn RequestInitialiser>]>,
}

impl App {
    /// See [`AppBuilder`] for a more ergonomic way to build `App` instances.
    pub fn new<H, T>(handler: H, middleware_stack: T) -> Self
    where
        H: Handler,
        T: Into<Box<[Arc<dyn Middleware>]>>,
    {
        App {
            handler: Arc::new(handler),
            middleware_stack: middleware_stack.into(),
            initialiser_stack: Box::new([]),
        }
    }

    /// Runs a request through the middleware chain and the handler.
    ///
    /// # Errors
    ///
    /// Returns whatever error the middleware or the handler produced, unchanged.
    pub async fn call(&self, req: Request) -> Result<Response> {
        let mut ext = Extensions::new();
        self.call_with_extensions(req, &mut ext).await
    }

    /// Runs a request with initial [`Extensions`].
    ///
    /// Request initialisers run first, then the middleware in the order it was attached.
    pub async fn call_with_extensions(
        &self,
        req: Request,
        ext: &mut Extensions,
    ) -> Result<Response> {
        let req = self
            .initialiser_stack
            .iter()
            .fold(req, |req, i| i.init(req, ext));
        let next = Next::new(&*self.handler, &self.middleware_stack);
        next.run(req, ext).await
    }

    /// Runs a request and renders any error into a response, the way a server would answer the
    /// client.
    pub async fn respond(&self, req: Request) -> Response {
        match self.call(req).await {
            Ok(res) => res,
            Err(err) => err.into_response(),
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // handlers and middleware are trait objects, only the stack depth is shown
        f.debug_struct("App")
            .field("middleware", &self.middleware_stack.len())
            .finish_non_exhaustive()
    }
}

mod service {
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    use crate::{middleware::BoxFuture, App, Request, Response, Result};

    // this is meant to be semi-private, same as the futures hyper hands out
    pub struct Pending {
        inner: BoxFuture<'static, Result<Response>>,
    }

    impl Unpin for Pending {}

    impl Future for Pending {
        type Output = Result<Response>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            self.inner.as_mut().poll(cx)
        }
    }

    impl tower_service::Service<Request> for App {
        type Response = Response;
        type Error = crate::Error;
        type Future = Pending;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            let app = self.clone();
            Pending {
                inner: Box::pin(async move { app.call(req).await }),
            }
        }
    }

    impl tower_service::Service<Request> for &'_ App {
        type Response = Response;
        type Error = crate::Error;
        type Future = Pending;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            let app = (*self).clone();
            Pending {
                inner: Box::pin(async move { app.call(req).await }),
            }
        }
    }
}
