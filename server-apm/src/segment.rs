use http::Extensions;

use crate::agent::{CurrentTransaction, NoopTransaction, Transaction};

/// Returns the transaction of the request being served, if it is being monitored.
pub fn from_extensions(extensions: &Extensions) -> Option<CurrentTransaction> {
    CurrentTransaction::from_extensions(extensions)
}

/// Opens a segment named `segment_name` on the current transaction and ends it straight away.
///
/// Without a transaction in `extensions` the segment is opened against a [`NoopTransaction`],
/// so calling this outside a monitored request is harmless.
pub fn send(extensions: &Extensions, segment_name: &str) {
    let current = from_extensions(extensions);
    let transaction: &dyn Transaction = match &current {
        Some(current) => &**current,
        None => &NoopTransaction,
    };

    let segment = transaction.start_segment(segment_name);
    segment.end();
}
