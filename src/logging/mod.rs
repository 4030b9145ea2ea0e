//! Structured logging via `tracing`.

mod format;

pub use format::{AuditLine, StructuredLogger};
