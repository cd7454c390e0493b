//! The narrow interface [`ApmMiddleware`](crate::ApmMiddleware) uses to talk to a monitoring
//! agent.
//!
//! Vendor SDKs are adapted by implementing [`Agent`], [`Transaction`] and [`Segment`].
//! Transactions must tolerate calls from any thread and must treat [`Transaction::end`] as
//! final.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::{Extensions, HeaderMap, StatusCode};
use tracing::Span;

use crate::web_request::WebRequest;

/// Starts transactions. Shared by every request the middleware sees.
pub trait Agent: 'static + Send + Sync {
    fn start_transaction(&self, name: &str) -> Arc<dyn Transaction>;
}

impl<A: Agent + ?Sized> Agent for Arc<A> {
    fn start_transaction(&self, name: &str) -> Arc<dyn Transaction> {
        (**self).start_transaction(name)
    }
}

/// One monitored request.
pub trait Transaction: 'static + Send + Sync {
    /// Describes the inbound request the transaction covers.
    fn set_web_request(&self, request: &WebRequest);

    /// Describes the response. Followed by [`write_header`](Self::write_header).
    fn set_web_response(&self, response: WebResponse);

    /// Records the final status code.
    fn write_header(&self, status: StatusCode);

    /// Reports an error against the transaction.
    fn notice_error(&self, error: &(dyn StdError + 'static));

    /// Opens a named unit of work inside the transaction.
    fn start_segment(&self, name: &str) -> Box<dyn Segment>;

    /// The span the rest of the handler chain runs in, for agents built on `tracing`.
    fn tracing_span(&self) -> Option<Span> {
        None
    }

    /// Finishes the transaction.
    fn end(&self);
}

/// A named sub-span of a [`Transaction`].
pub trait Segment: Send {
    fn end(self: Box<Self>);
}

/// Response details attached to a transaction.
///
/// The middleware attaches an empty descriptor and reports the status code only.
#[derive(Clone, Debug, Default)]
pub struct WebResponse {
    pub headers: Option<HeaderMap>,
}

/// The transaction of the request being served, stored in the request's [`Extensions`].
#[derive(Clone)]
pub struct CurrentTransaction(Arc<dyn Transaction>);

impl CurrentTransaction {
    pub fn new(transaction: Arc<dyn Transaction>) -> Self {
        Self(transaction)
    }

    /// Returns the current transaction if the request is being monitored.
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<Self>().cloned()
    }

    pub(crate) fn insert_into(&self, extensions: &mut Extensions) {
        extensions.insert(self.clone());
    }
}

impl std::ops::Deref for CurrentTransaction {
    type Target = dyn Transaction;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for CurrentTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentTransaction").finish_non_exhaustive()
    }
}

/// Ends the transaction when dropped, so it is ended on every exit path including a panic in
/// the handler chain.
pub(crate) struct TransactionGuard(Arc<dyn Transaction>);

impl TransactionGuard {
    pub(crate) fn new(transaction: Arc<dyn Transaction>) -> Self {
        Self(transaction)
    }

    pub(crate) fn current(&self) -> CurrentTransaction {
        CurrentTransaction::new(Arc::clone(&self.0))
    }
}

impl std::ops::Deref for TransactionGuard {
    type Target = dyn Transaction;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        self.0.end();
    }
}

/// Stands in when no transaction is available. Every call is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransaction;

impl Transaction for NoopTransaction {
    fn set_web_request(&self, _request: &WebRequest) {}

    fn set_web_response(&self, _response: WebResponse) {}

    fn write_header(&self, _status: StatusCode) {}

    fn notice_error(&self, _error: &(dyn StdError + 'static)) {}

    fn start_segment(&self, _name: &str) -> Box<dyn Segment> {
        Box::new(NoopSegment)
    }

    fn end(&self) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSegment;

impl Segment for NoopSegment {
    fn end(self: Box<Self>) {}
}
