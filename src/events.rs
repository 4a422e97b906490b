//! Failure reporting channel.
//!
//! Lookups, favicon fetches and reminder creation never surface failures as
//! panics or dialogs. They send a [`FailureEvent`] to a [`FailureSink`]
//! instead. The binary installs [`TracingSink`]; tests install
//! [`RecordingSink`] and assert on what was emitted.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

/// A contained failure raised by one user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureEvent {
    /// Certificate lookup failed; the view shows an inline error line.
    LookupFailed { domain: String, message: String },
    /// No favicon could be fetched or decoded.
    FaviconUnavailable { domain: String, reason: String },
    /// Renewal reminder could not be written or opened.
    ReminderFailed { domain: String, reason: String },
}

impl FailureEvent {
    pub fn domain(&self) -> &str {
        match self {
            Self::LookupFailed { domain, .. }
            | Self::FaviconUnavailable { domain, .. }
            | Self::ReminderFailed { domain, .. } => domain,
        }
    }
}

impl fmt::Display for FailureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed { domain, message } => {
                write!(f, "certificate lookup for {} failed: {}", domain, message)
            }
            Self::FaviconUnavailable { domain, reason } => {
                write!(f, "no favicon for {}: {}", domain, reason)
            }
            Self::ReminderFailed { domain, reason } => {
                write!(f, "error creating calendar event for {}: {}", domain, reason)
            }
        }
    }
}

/// Receives failure events. Implementations must not panic.
pub trait FailureSink: Send + Sync + fmt::Debug {
    fn report(&self, event: FailureEvent);
}

/// Logs failure events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, event: FailureEvent) {
        match &event {
            FailureEvent::LookupFailed { domain, message } => {
                warn!(%domain, %message, "certificate lookup failed")
            }
            FailureEvent::FaviconUnavailable { domain, reason } => {
                debug!(%domain, %reason, "favicon unavailable")
            }
            FailureEvent::ReminderFailed { domain, reason } => {
                error!(%domain, %reason, "error creating calendar event")
            }
        }
    }
}

/// Keeps every reported event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<FailureEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events reported so far.
    pub fn events(&self) -> Vec<FailureEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, event: FailureEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
