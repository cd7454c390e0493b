use http::header::HOST;
use http::{HeaderMap, Method};
use server_middleware::{Request, RequestExt};

/// The description of an inbound request handed to [`Transaction::set_web_request`].
///
/// [`Transaction::set_web_request`]: crate::Transaction::set_web_request
#[derive(Clone, Debug)]
pub struct WebRequest {
    pub method: Method,
    pub url: WebUrl,
    pub headers: HeaderMap,
    pub host: String,
}

/// The URL parts of a [`WebRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WebUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub raw_query: String,
}

impl WebRequest {
    /// Synthesizes the description of `req`.
    ///
    /// The host prefers the `Host` header and falls back to the URI authority. Headers are
    /// flattened: a name sent more than once keeps only its last value.
    pub fn from_request(req: &Request) -> Self {
        let headers = flatten_headers(req.headers());

        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|host| !host.is_empty())
            .or_else(|| req.hostname())
            .unwrap_or_default()
            .to_owned();

        WebRequest {
            method: req.method().clone(),
            url: WebUrl {
                scheme: req.scheme().to_owned(),
                host: host.clone(),
                path: req.uri().path().to_owned(),
                raw_query: req.raw_query().to_owned(),
            },
            headers,
            host,
        }
    }

    /// The `User-Agent` header, if it is valid text.
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }
}

fn flatten_headers(headers: &HeaderMap) -> HeaderMap {
    let mut flat = HeaderMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        flat.insert(name.clone(), value.clone());
    }
    flat
}
