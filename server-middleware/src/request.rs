use http::header::HOST;
use http::uri::Scheme;

use crate::Request;

/// Accessors for request details that are not a single field lookup on [`http::Request`].
pub trait RequestExt {
    /// The request scheme.
    ///
    /// Taken from an absolute-form URI, then from a [`Scheme`] the server stored in the request
    /// extensions for the connection, then from `X-Forwarded-Proto`. Defaults to `http`.
    ///
    /// ```
    /// use http::uri::Scheme;
    /// use server_middleware::{Request, RequestExt};
    ///
    /// let mut req: Request = http::Request::get("/pay").body(Default::default()).unwrap();
    /// assert_eq!(req.scheme(), "http");
    ///
    /// // A TLS listener records how the connection was accepted.
    /// req.extensions_mut().insert(Scheme::HTTPS);
    /// assert_eq!(req.scheme(), "https");
    /// ```
    fn scheme(&self) -> &str;

    /// The host the request was addressed to as seen by the app: the URI authority if the
    /// request line carried one, otherwise the `Host` header.
    fn hostname(&self) -> Option<&str>;

    /// The raw query string, without the leading `?`. Empty when there is none.
    fn raw_query(&self) -> &str;
}

impl RequestExt for Request {
    fn scheme(&self) -> &str {
        self.uri()
            .scheme_str()
            .or_else(|| self.extensions().get::<Scheme>().map(Scheme::as_str))
            .or_else(|| forwarded_proto(self))
            .unwrap_or("http")
    }

    fn hostname(&self) -> Option<&str> {
        self.uri()
            .authority()
            // userinfo never belongs in a host
            .map(|authority| authority.as_str().rsplit('@').next().unwrap_or_default())
            .or_else(|| self.headers().get(HOST).and_then(|v| v.to_str().ok()))
            .filter(|host| !host.is_empty())
    }

    fn raw_query(&self) -> &str {
        self.uri().query().unwrap_or_default()
    }
}

/// The first protocol listed in `X-Forwarded-Proto`.
fn forwarded_proto(req: &Request) -> Option<&str> {
    req.headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|proto| !proto.is_empty())
}
