mod handlers;

pub use capture::{capture_spans, CapturedSpan, CapturedSpans};
pub use handlers::*;
pub use recording_agent::{RecordedTransaction, RecordingAgent};
pub use simple_server::SimpleServer;
