//! Command abstractions for the request layer.

use uuid::Uuid;

/// Trait that every request-layer command implements.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted command name, used in log fields.
    fn command_type(&self) -> &'static str;

    /// Correlation ID that ties the command to its log lines.
    fn correlation_id(&self) -> Uuid;
}
