use std::sync::Arc;

use matchit::Router;
use server_middleware::Request;
use tracing::{debug, warn};

use crate::config::{default_transaction_name, TransactionNameFn};

/// [`KnownPaths`] names transactions after route templates rather than raw paths.
///
/// When naming a transaction the request path is matched against the known routes. If it
/// matches, the transaction is named `"{METHOD} {ROUTE}"`, which keeps identifiers out of
/// transaction names. Unknown paths keep the default `"{METHOD} {PATH}"` name.
///
/// ```
/// use server_apm::{config_custom_transaction_name_func, ApmMiddleware, KnownPaths, TracingAgent};
///
/// let names = KnownPaths::new(["/users/{id}", "/users/{id}/orders/{*rest}"]);
/// let apm = ApmMiddleware::new(
///     Some(TracingAgent::new()),
///     [config_custom_transaction_name_func(move |req| names.transaction_name(req))],
/// );
/// ```
#[derive(Clone)]
pub struct KnownPaths(Router<String>);

impl KnownPaths {
    /// Create a new [`KnownPaths`] from a set of route templates.
    ///
    /// Routes can have different parameters:
    /// - Named parameters like `{id}` match anything until the next `/` or the end of the path.
    /// - Catch-all parameters like `{*rest}` match everything after the `/`. They must be at
    ///   the end of the route.
    ///
    /// Routes that cannot be registered are skipped.
    pub fn new<Paths, Path>(paths: Paths) -> Self
    where
        Paths: IntoIterator<Item = Path>,
        Path: Into<String>,
    {
        let router = paths.into_iter().fold(Router::new(), |mut router, path| {
            let path = path.into();
            if let Err(error) = router.insert(path.clone(), path.clone()) {
                warn!(path = %path, error = %error, "Invalid route cannot be added to known paths");
            }

            router
        });

        Self(router)
    }

    /// Find the route template matching the raw path.
    ///
    /// ```
    /// # use server_apm::KnownPaths;
    /// let names = KnownPaths::new(["/payment/{payment_id}"]);
    /// assert_eq!(names.find("/payment/payment-id-123"), Some("/payment/{payment_id}"));
    /// ```
    pub fn find(&self, path: &str) -> Option<&str> {
        self.0.at(path).map(|mtch| mtch.value.as_str()).ok()
    }

    /// Names `req` after its route, falling back to [`default_transaction_name`].
    pub fn transaction_name(&self, req: &Request) -> String {
        match self.find(req.uri().path()) {
            Some(route) => format!("{} {}", req.method(), route),
            None => {
                debug!(path = %req.uri().path(), "No known path matched");
                default_transaction_name(req)
            }
        }
    }

    /// Turns the routes into a naming function.
    pub fn into_name_func(self) -> TransactionNameFn {
        Arc::new(move |req: &Request| self.transaction_name(req))
    }
}
