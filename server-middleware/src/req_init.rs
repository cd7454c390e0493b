use http::Extensions;

use crate::Request;

/// When attached to an [`App`] (generally using [`with_init`]), it is run whenever the app
/// receives a request, before any middleware, in the order it was attached.
///
/// # Example
///
/// ```
/// use http::Extensions;
/// use server_middleware::{Request, RequestInitialiser};
///
/// struct ForwardedProto;
///
/// impl RequestInitialiser for ForwardedProto {
///     fn init(&self, mut req: Request, _ext: &mut Extensions) -> Request {
///         req.headers_mut()
///             .insert("x-forwarded-proto", http::HeaderValue::from_static("https"));
///         req
///     }
/// }
/// ```
///
/// [`App`]: crate::App
/// [`with_init`]: crate::AppBuilder::with_init
pub trait RequestInitialiser: 'static + Send + Sync {
    fn init(&self, req: Request, ext: &mut Extensions) -> Request;
}

/// An initialiser that inserts the value into the [`Extensions`] of every request.
///
/// This is a good way to inject extensions to middleware deeper in the stack
///
/// ```
/// use server_middleware::{handler_fn, AppBuilder, Extension, Request, Response, Result};
///
/// #[derive(Clone)]
/// struct ServiceName(&'static str);
///
/// async fn hello(_req: Request) -> Result<Response> {
///     Ok(Response::new("hello".into()))
/// }
///
/// let app = AppBuilder::new(handler_fn(hello))
///     .with_init(Extension(ServiceName("accounts")))
///     .build();
/// ```
pub struct Extension<T>(pub T);

impl<T: Send + Sync + Clone + 'static> RequestInitialiser for Extension<T> {
    fn init(&self, req: Request, ext: &mut Extensions) -> Request {
        ext.insert(self.0.clone());
        req
    }
}
