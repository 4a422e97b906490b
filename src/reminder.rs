//! Certificate renewal reminders as iCalendar files.
//!
//! A reminder is a single zero-duration event placed a fixed lead time before
//! the certificate expires. The `.ics` file is written to a temporary path,
//! kept after the process exits, and handed to the desktop's calendar.

use chrono::{DateTime, TimeDelta, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::Builder;
use tracing::info;

use crate::error::NetViewerError;
use crate::events::{FailureEvent, FailureSink};
use crate::opener::OpenWithDefaultApplication;

pub const DEFAULT_LEAD_DAYS: i64 = 14;
/// Longest lead time accepted from configuration, about ten years.
pub const MAX_LEAD_DAYS: i64 = 3650;

const PRODID: &str = "-//NetViewer SSL Certificate Renewal//EN";
const ICS_STAMP: &str = "%Y%m%dT%H%M%SZ";
const MAX_LINE_OCTETS: usize = 75;

/// `expiry` moved back by `lead_days` whole days, or `None` when the result
/// falls outside the representable date range.
pub fn reminder_time(expiry: DateTime<Utc>, lead_days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(lead_days).and_then(|lead| expiry.checked_sub_signed(lead))
}

/// One renewal reminder, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEvent {
    pub domain: String,
    pub expiry: DateTime<Utc>,
    pub reminder_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ReminderEvent {
    pub fn new(
        domain: &str,
        expiry: DateTime<Utc>,
        lead_days: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NetViewerError> {
        let reminder_at =
            reminder_time(expiry, lead_days).ok_or_else(|| NetViewerError::Calendar {
                reason: format!("lead time of {} days is out of range", lead_days),
            })?;
        Ok(ReminderEvent {
            domain: domain.to_string(),
            expiry,
            reminder_at,
            created_at,
        })
    }

    pub fn summary(&self) -> String {
        format!("SSL Certificate Renewal - {}", self.domain)
    }

    pub fn description(&self) -> String {
        format!(
            "SSL certificate for {} expires on {}. Please renew the certificate before expiration.",
            self.domain,
            self.expiry.format("%B %d, %Y")
        )
    }

    /// Serializes the event as a VCALENDAR object with CRLF line endings.
    pub fn to_ics(&self) -> String {
        let stamp = self.created_at.format(ICS_STAMP).to_string();
        let at = self.reminder_at.format(ICS_STAMP).to_string();
        let properties = [
            ("BEGIN", "VCALENDAR".to_string()),
            ("PRODID", PRODID.to_string()),
            ("VERSION", "2.0".to_string()),
            ("BEGIN", "VEVENT".to_string()),
            ("UID", escape_text(&format!("{}-{}@netviewer", stamp, self.domain))),
            ("SUMMARY", escape_text(&self.summary())),
            ("DESCRIPTION", escape_text(&self.description())),
            ("DTSTART", at.clone()),
            ("DTEND", at),
            ("DTSTAMP", stamp),
            ("CLASS", "PUBLIC".to_string()),
            ("TRANSP", "TRANSPARENT".to_string()),
            ("END", "VEVENT".to_string()),
            ("END", "VCALENDAR".to_string()),
        ];

        let mut ics = String::new();
        for (name, value) in properties {
            ics.push_str(&fold_line(&format!("{}:{}", name, value)));
            ics.push_str("\r\n");
        }
        ics
    }
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

// Continuation lines start with one space, which counts toward the limit.
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len());
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += len;
    }
    folded
}

/// Writes reminder files and opens them.
#[derive(Debug)]
pub struct ReminderEventBuilder {
    lead_days: i64,
    directory: Option<PathBuf>,
    opener: Box<dyn OpenWithDefaultApplication>,
    sink: Arc<dyn FailureSink>,
}

impl ReminderEventBuilder {
    pub fn new(opener: Box<dyn OpenWithDefaultApplication>, sink: Arc<dyn FailureSink>) -> Self {
        ReminderEventBuilder {
            lead_days: DEFAULT_LEAD_DAYS,
            directory: None,
            opener,
            sink,
        }
    }

    pub fn with_lead_days(mut self, lead_days: i64) -> Self {
        self.lead_days = lead_days;
        self
    }

    /// Writes files under `directory` instead of the system temp dir.
    pub fn with_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    pub fn lead_days(&self) -> i64 {
        self.lead_days
    }

    /// Writes and opens a reminder for `domain`.
    ///
    /// Returns the file path, or `None` after reporting the failure.
    pub fn build(&self, domain: &str, expiry: DateTime<Utc>) -> Option<PathBuf> {
        match self.try_build(domain, expiry) {
            Ok(path) => Some(path),
            Err(e) => {
                self.sink.report(FailureEvent::ReminderFailed {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn try_build(&self, domain: &str, expiry: DateTime<Utc>) -> Result<PathBuf, NetViewerError> {
        let event = ReminderEvent::new(domain, expiry, self.lead_days, Utc::now())?;
        let path = self.write(&event.to_ics())?;
        info!(%domain, path = %path.display(), reminder_at = %event.reminder_at, "calendar event written");
        self.opener.open(&path)?;
        Ok(path)
    }

    fn write(&self, ics: &str) -> Result<PathBuf, NetViewerError> {
        let mut builder = Builder::new();
        builder.prefix("netviewer-").suffix(".ics");
        let mut file = match &self.directory {
            Some(directory) => builder.tempfile_in(directory),
            None => builder.tempfile(),
        }
        .map_err(|e| NetViewerError::Calendar {
            reason: format!("cannot create temporary file: {}", e),
        })?;
        file.write_all(ics.as_bytes())?;
        let (_, path) = file.keep().map_err(|e| NetViewerError::Calendar {
            reason: e.error.to_string(),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::opener::NoopOpener;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingOpener {
        opened: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl OpenWithDefaultApplication for RecordingOpener {
        fn open(&self, path: &Path) -> Result<(), NetViewerError> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingOpener;

    impl OpenWithDefaultApplication for FailingOpener {
        fn open(&self, path: &Path) -> Result<(), NetViewerError> {
            Err(NetViewerError::OpenFailed {
                path: path.to_path_buf(),
                reason: "no launcher".to_string(),
            })
        }
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_reminder_time_crosses_leap_february() {
        assert_eq!(reminder_time(utc(2024, 3, 1), 14), Some(utc(2024, 2, 16)));
        assert_eq!(reminder_time(utc(2023, 3, 1), 14), Some(utc(2023, 2, 15)));
    }

    #[test]
    fn test_reminder_time_out_of_range() {
        assert_eq!(reminder_time(utc(2025, 1, 1), i64::MAX), None);
        assert_eq!(reminder_time(utc(2025, 1, 1), 1_000_000_000_000_000), None);
        assert!(ReminderEvent::new("example.com", utc(2025, 1, 1), i64::MAX, utc(2024, 11, 17)).is_err());
    }

    #[test]
    fn test_ics_content() {
        let event = ReminderEvent::new("example.com", utc(2025, 1, 1), 14, utc(2024, 11, 17)).unwrap();
        let ics = event.to_ics();
        let unfolded = ics.replace("\r\n ", "");

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(unfolded.contains("SUMMARY:SSL Certificate Renewal - example.com\r\n"));
        assert!(unfolded.contains(
            "DESCRIPTION:SSL certificate for example.com expires on January 01\\, 2025. Please renew the certificate before expiration.\r\n"
        ));
        assert!(unfolded.contains("DTSTART:20241218T000000Z\r\n"));
        assert!(unfolded.contains("DTEND:20241218T000000Z\r\n"));
        assert!(unfolded.contains("DTSTAMP:20241117T000000Z\r\n"));
        assert!(unfolded.contains("CLASS:PUBLIC\r\n"));
        assert!(unfolded.contains("TRANSP:TRANSPARENT\r\n"));
    }

    #[test]
    fn test_long_lines_are_folded() {
        let event = ReminderEvent::new("example.com", utc(2025, 1, 1), 14, utc(2024, 11, 17)).unwrap();
        for line in event.to_ics().split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS, "line too long: {:?}", line);
        }
        assert_eq!(fold_line("é".repeat(40).as_str()).split("\r\n ").count(), 2);
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }

    #[test]
    fn test_build_writes_and_opens() {
        let dir = tempfile::tempdir().unwrap();
        let opener = RecordingOpener::default();
        let opened = Arc::clone(&opener.opened);
        let sink = RecordingSink::new();
        let builder = ReminderEventBuilder::new(Box::new(opener), Arc::new(sink.clone()))
            .with_directory(dir.path());

        let path = builder.build("example.com", utc(2025, 1, 1)).unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("ics"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("DTSTART:20241218T000000Z"));
        assert_eq!(*opened.lock().unwrap(), vec![path]);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_open_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let builder = ReminderEventBuilder::new(Box::new(FailingOpener), Arc::new(sink.clone()))
            .with_directory(dir.path());

        assert_eq!(builder.build("example.com", utc(2025, 1, 1)), None);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            FailureEvent::ReminderFailed { reason, .. } if reason.contains("no launcher")
        ));
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let sink = RecordingSink::new();
        let builder = ReminderEventBuilder::new(Box::new(NoopOpener), Arc::new(sink.clone()))
            .with_directory("/nonexistent/netviewer/reminders");

        assert_eq!(builder.build("example.com", utc(2025, 1, 1)), None);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_huge_lead_time_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let builder = ReminderEventBuilder::new(Box::new(NoopOpener), Arc::new(sink.clone()))
            .with_directory(dir.path())
            .with_lead_days(1_000_000_000_000_000);

        assert_eq!(builder.build("example.com", utc(2025, 1, 1)), None);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            FailureEvent::ReminderFailed { domain, reason }
                if domain == "example.com" && reason.contains("out of range")
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
