//! Tracing and logging setup shared by the binaries.

/// Tracing configuration (filters, layers, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat, new_request_id};

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    crate::tracing::init(format);
}
