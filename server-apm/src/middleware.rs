use std::fmt;
use std::sync::Arc;

use http::{Extensions, StatusCode};
use server_middleware::{Error, Middleware, Next, Request, Response, Result};
use tracing::{debug, trace, Instrument};

use crate::agent::{Agent, CurrentTransaction, Transaction, TransactionGuard, WebResponse};
use crate::config::{ConfigMap, ConfigOption, InstrumentationConfig};
use crate::web_request::WebRequest;

/// Middleware reporting every request to a monitoring [`Agent`] as a transaction.
///
/// Configuration is resolved once, when the middleware is built. Without an agent the
/// middleware passes requests straight through, so monitoring is never required to serve
/// traffic.
///
/// ```
/// use server_apm::{config_notice_error_enabled, config_status_code_ignored, ApmMiddleware, TracingAgent};
/// use server_middleware::{handler_fn, AppBuilder, Request, Response, Result};
///
/// async fn hello(_req: Request) -> Result<Response> {
///     Ok(Response::new("hello".into()))
/// }
///
/// let apm = ApmMiddleware::new(
///     Some(TracingAgent::new()),
///     [
///         config_notice_error_enabled(true),
///         config_status_code_ignored([404]),
///     ],
/// );
///
/// let app = AppBuilder::new(handler_fn(hello)).with(apm).build();
/// ```
#[derive(Clone)]
pub struct ApmMiddleware {
    agent: Option<Arc<dyn Agent>>,
    config: Arc<InstrumentationConfig>,
}

impl ApmMiddleware {
    pub fn new<A, I>(agent: Option<A>, options: I) -> Self
    where
        A: Agent,
        I: IntoIterator<Item = ConfigOption>,
    {
        match agent {
            Some(agent) => Self::with_arc(Arc::new(agent), options),
            None => Self::disabled(),
        }
    }

    /// Same as [`new`] for an agent that is already shared.
    ///
    /// [`new`]: Self::new
    pub fn with_arc<I>(agent: Arc<dyn Agent>, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let config = InstrumentationConfig::from_map(&ConfigMap::from_options(options));
        Self {
            agent: Some(agent),
            config: Arc::new(config),
        }
    }

    /// A middleware that only forwards requests.
    pub fn disabled() -> Self {
        Self {
            agent: None,
            config: Arc::new(InstrumentationConfig::from_map(&ConfigMap::default())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.agent.is_some()
    }

    /// Reports `err` unless reporting is off or its status is ignored. Returns the status the
    /// transaction is closed with.
    fn notice_error(&self, transaction: &dyn Transaction, err: &Error) -> StatusCode {
        let status = err
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.config.notice_error_enabled {
            if self.config.is_ignored(status.as_u16()) {
                trace!(status = status.as_u16(), "Error not reported, status code is ignored");
            } else {
                transaction.notice_error(err);
            }
        }

        status
    }
}

impl fmt::Debug for ApmMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApmMiddleware")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait::async_trait]
impl Middleware for ApmMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let agent = match &self.agent {
            Some(agent) => agent,
            None => return next.run(req, extensions).await,
        };

        let name = self.config.transaction_name(&req, extensions);
        debug!(transaction = %name, "Starting transaction");

        let transaction = TransactionGuard::new(agent.start_transaction(&name));
        transaction.set_web_request(&WebRequest::from_request(&req));
        transaction.current().insert_into(extensions);

        let outcome = match transaction.tracing_span() {
            Some(span) => next.run(req, extensions).instrument(span).await,
            None => next.run(req, extensions).await,
        };

        let status = match &outcome {
            Ok(res) => res.status(),
            Err(err) => self.notice_error(&*transaction, err),
        };
        transaction.set_web_response(WebResponse::default());
        transaction.write_header(status);

        // The transaction must be closed before control returns to the outer chain.
        drop(transaction);
        extensions.remove::<CurrentTransaction>();
        debug!(transaction = %name, status = status.as_u16(), "Transaction ended");

        outcome
    }
}
