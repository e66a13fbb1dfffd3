use std::error::Error;

use tracing::error;

/// Sink for failures the engine recovered from.
pub trait ErrorLog: Send + Sync {
  fn error(&self, doc_id: &str, message: &str, cause: &(dyn Error + 'static));
}

/// Forwards recovered failures to `tracing` at error level.
#[derive(Debug, Clone, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
  fn error(&self, doc_id: &str, message: &str, cause: &(dyn Error + 'static)) {
    error!(doc_id = %doc_id, error = %cause, "{}", message);
  }
}
