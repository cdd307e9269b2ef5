//! Observability for docshape
//!
//! Structured logging through `tracing`. Every store event is emitted with
//! an `event` field holding a typed `Event` name plus the store name.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Logging failures never fail an operation

mod events;
mod logging;

pub use events::Event;
pub use logging::init_logging;

/// Log a store event with pre-formatted detail.
///
/// Warning events go out at WARN, everything else at INFO.
pub fn log_event(event: Event, store: &str, detail: &str) {
    if event.is_warning() {
        tracing::warn!(event = event.as_str(), store, detail, "{}", event);
    } else {
        tracing::info!(event = event.as_str(), store, detail, "{}", event);
    }
}
