//! The SSL certificate page.
//!
//! [`CertificateLookupView`] owns everything the page shows: the last domain,
//! the favicon next to the input, and the result panel. A lookup replaces the
//! panel wholesale; failures become a single `Error: ...` line.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info_span};

use crate::certificate::{CertificateInfo, CertificateProvider};
use crate::dates::{format_date, parse_timestamp};
use crate::error::NetViewerError;
use crate::events::{FailureEvent, FailureSink};
use crate::favicon::{Favicon, FaviconFetcher, FaviconPoll, FaviconTask};
use crate::reminder::ReminderEventBuilder;

pub const UNKNOWN: &str = "Unknown";

/// Row labels in display order.
pub const FIELD_LABELS: [&str; 7] = [
    "Subject",
    "Issuer",
    "Valid From",
    "Valid Until",
    "Days Until Expiry",
    "Version",
    "Serial Number",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub label: &'static str,
    pub value: String,
}

/// The "Add Renewal Reminder" control, offered when the expiry parses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderAction {
    pub domain: String,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultPanel {
    #[default]
    Hidden,
    Certificate {
        rows: Vec<FieldRow>,
        reminder: Option<ReminderAction>,
    },
    Error(String),
}

impl ResultPanel {
    pub fn rows(&self) -> &[FieldRow] {
        match self {
            ResultPanel::Certificate { rows, .. } => rows,
            _ => &[],
        }
    }

    pub fn reminder(&self) -> Option<&ReminderAction> {
        match self {
            ResultPanel::Certificate { reminder, .. } => reminder.as_ref(),
            _ => None,
        }
    }

    pub fn error_line(&self) -> Option<&str> {
        match self {
            ResultPanel::Error(line) => Some(line),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, ResultPanel::Hidden)
    }
}

/// Display rows for `info`, in [`FIELD_LABELS`] order.
pub fn render_rows(info: &CertificateInfo) -> Vec<FieldRow> {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
    let date = |value: &Option<String>| format_date(value.as_deref().unwrap_or(UNKNOWN));

    let values = [
        text(&info.subject),
        text(&info.issuer),
        date(&info.not_before),
        date(&info.not_after),
        info.days_until_expiry
            .map(|days| days.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        text(&info.version),
        text(&info.serial_number),
    ];

    FIELD_LABELS
        .into_iter()
        .zip(values)
        .map(|(label, value)| FieldRow { label, value })
        .collect()
}

pub struct CertificateLookupView {
    provider: Box<dyn CertificateProvider>,
    favicons: Option<FaviconFetcher>,
    sink: Arc<dyn FailureSink>,
    domain: Option<String>,
    panel: ResultPanel,
    favicon: Option<Favicon>,
    pending_favicon: Option<FaviconTask>,
}

impl CertificateLookupView {
    pub fn new(provider: Box<dyn CertificateProvider>, sink: Arc<dyn FailureSink>) -> Self {
        CertificateLookupView {
            provider,
            favicons: None,
            sink,
            domain: None,
            panel: ResultPanel::Hidden,
            favicon: None,
            pending_favicon: None,
        }
    }

    /// Enables favicon fetching next to the domain input.
    pub fn with_favicons(mut self, fetcher: FaviconFetcher) -> Self {
        self.favicons = Some(fetcher);
        self
    }

    /// Looks up the certificate for `domain` and replaces the result panel.
    ///
    /// Blank input is ignored. Failures never escape; they end up as the
    /// panel's error line and a [`FailureEvent::LookupFailed`].
    pub fn lookup(&mut self, domain: &str) {
        let domain = domain.trim();
        if domain.is_empty() {
            return;
        }
        let _span = info_span!("lookup", %domain).entered();

        self.panel = ResultPanel::Hidden;
        self.favicon = None;
        if let Some(task) = self.pending_favicon.take() {
            task.cancel();
        }
        self.pending_favicon = self.favicons.as_ref().map(|fetcher| fetcher.spawn(domain));
        self.domain = Some(domain.to_string());

        self.panel = match self.resolve(domain) {
            Ok(panel) => panel,
            Err(e) => {
                self.sink.report(FailureEvent::LookupFailed {
                    domain: domain.to_string(),
                    message: e.to_string(),
                });
                ResultPanel::Error(format!("Error: {}", e))
            }
        };
    }

    fn resolve(&self, domain: &str) -> Result<ResultPanel, NetViewerError> {
        let info = self
            .provider
            .check_certificate(domain)?
            .filter(|info| !info.is_empty())
            .ok_or(NetViewerError::NoCertificateData)?;

        let rows = render_rows(&info);
        let reminder = info
            .not_after
            .as_deref()
            .and_then(parse_timestamp)
            .map(|expiry| ReminderAction {
                domain: domain.to_string(),
                expiry,
            });
        if reminder.is_none() {
            debug!("expiry not parseable, reminder not offered");
        }
        Ok(ResultPanel::Certificate { rows, reminder })
    }

    /// Picks up a finished favicon without blocking. Returns true when an
    /// icon was just installed.
    pub fn poll_favicon(&mut self) -> bool {
        let poll = match &self.pending_favicon {
            Some(task) => task.try_take(),
            None => return false,
        };
        self.settle_favicon(poll)
    }

    /// Like [`poll_favicon`](Self::poll_favicon) but waits up to `timeout`.
    pub fn wait_for_favicon(&mut self, timeout: Duration) -> bool {
        let poll = match &self.pending_favicon {
            Some(task) => task.wait(timeout),
            None => return false,
        };
        self.settle_favicon(poll)
    }

    fn settle_favicon(&mut self, poll: FaviconPoll) -> bool {
        match poll {
            FaviconPoll::Pending => false,
            FaviconPoll::Ready(favicon) => {
                self.pending_favicon = None;
                self.favicon = favicon;
                self.favicon.is_some()
            }
        }
    }

    /// Cancels background work when the page goes out of view.
    pub fn dismiss(&mut self) {
        if let Some(task) = self.pending_favicon.take() {
            task.cancel();
        }
    }

    /// Runs the offered reminder action, if any.
    pub fn add_renewal_reminder(&self, builder: &ReminderEventBuilder) -> Option<PathBuf> {
        let action = self.panel.reminder()?;
        builder.build(&action.domain, action.expiry)
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn panel(&self) -> &ResultPanel {
        &self.panel
    }

    pub fn favicon(&self) -> Option<&Favicon> {
        self.favicon.as_ref()
    }

    pub fn favicon_pending(&self) -> bool {
        self.pending_favicon.is_some()
    }
}
