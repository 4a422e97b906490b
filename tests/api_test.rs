//! Integration tests for the public API

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netviewer::shell::ToolPage;
use netviewer::{
    ApplicationShell, CertificateInfo, CertificateLookupView, FailureEvent, FaviconFetcher,
    FaviconSettings, NetViewerError, OpenWithDefaultApplication, RecordingSink,
    ReminderEventBuilder, ToolKind,
};

#[derive(Debug, Default)]
struct CapturingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl OpenWithDefaultApplication for CapturingOpener {
    fn open(&self, path: &Path) -> Result<(), NetViewerError> {
        let content = std::fs::read_to_string(path)?;
        self.opened.lock().unwrap().push(content);
        Ok(())
    }
}

fn digicert() -> CertificateInfo {
    CertificateInfo {
        subject: Some("CN=example.com".to_string()),
        issuer: Some("CN=DigiCert".to_string()),
        not_before: Some("2024-01-01T00:00:00Z".to_string()),
        not_after: Some("2024-03-01T00:00:00Z".to_string()),
        days_until_expiry: Some(45),
        version: Some("3".to_string()),
        serial_number: Some("04:A1:B2".to_string()),
    }
}

fn counting_view(calls: Arc<AtomicUsize>, sink: &RecordingSink) -> CertificateLookupView {
    let provider = move |domain: &str| -> Result<Option<CertificateInfo>, NetViewerError> {
        calls.fetch_add(1, Ordering::SeqCst);
        match domain {
            "example.com" => Ok(Some(digicert())),
            "empty.example" => Ok(None),
            _ => Err(NetViewerError::HandshakeFailed {
                details: "peer closed connection".to_string(),
            }),
        }
    };
    CertificateLookupView::new(Box::new(provider), Arc::new(sink.clone()))
}

#[test]
fn test_lookup_then_reminder() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new();
    let opener = CapturingOpener::default();
    let opened = Arc::clone(&opener.opened);
    let reminders = ReminderEventBuilder::new(Box::new(opener), Arc::new(sink.clone()))
        .with_directory(dir.path());

    let mut view = counting_view(Arc::default(), &sink);
    view.lookup("example.com");

    assert_eq!(view.panel().rows().len(), 7);
    let path = view.add_renewal_reminder(&reminders).unwrap();
    assert!(path.exists());

    let opened = opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    let unfolded = opened[0].replace("\r\n ", "");
    assert!(unfolded.contains("DTSTART:20240216T000000Z"));
    assert!(unfolded.contains("expires on March 01\\, 2024"));
    assert!(sink.events().is_empty());
}

#[test]
fn test_failures_reach_the_sink() {
    let sink = RecordingSink::new();
    let mut view = counting_view(Arc::default(), &sink);

    view.lookup("empty.example");
    view.lookup("broken.example");

    assert_eq!(
        view.panel().error_line(),
        Some("Error: TLS handshake failed: peer closed connection")
    );
    assert!(view.panel().rows().is_empty());
    assert_eq!(
        sink.events(),
        vec![
            FailureEvent::LookupFailed {
                domain: "empty.example".to_string(),
                message: "Failed to retrieve certificate information".to_string(),
            },
            FailureEvent::LookupFailed {
                domain: "broken.example".to_string(),
                message: "TLS handshake failed: peer closed connection".to_string(),
            },
        ]
    );
}

#[test]
fn test_shell_routes_input_to_certificate_page() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = RecordingSink::new();
    let mut shell = ApplicationShell::new(counting_view(Arc::clone(&calls), &sink));

    assert!(shell.select_kind(ToolKind::Ssl));
    match shell.current_page_mut() {
        ToolPage::Certificate(view) => view.lookup("example.com"),
        ToolPage::Placeholder(kind) => panic!("expected certificate page, got {}", kind),
    }
    assert!(shell.select_tool(2));
    assert!(!shell.select_tool(5));

    let selected: Vec<bool> = shell.sidebar().iter().map(|entry| entry.selected).collect();
    assert_eq!(selected, vec![false, false, true]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(shell.certificate_view().unwrap().panel().rows().len(), 7);
}

#[test]
fn test_favicon_arrives_in_background() {
    let mut body = std::io::Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(64, 64, image::Rgba([40, 167, 69, 255]))
        .write_to(&mut body, image::ImageFormat::Png)
        .unwrap();

    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/s2/favicons")
        .match_query(mockito::Matcher::UrlEncoded(
            "domain".into(),
            "example.com".into(),
        ))
        .with_status(200)
        .with_body(body.into_inner())
        .create();

    let sink = RecordingSink::new();
    let settings = FaviconSettings {
        endpoint: format!("{}/s2/favicons", server.url()),
        ..FaviconSettings::default()
    };
    let fetcher = FaviconFetcher::new(settings, Arc::new(sink.clone())).unwrap();
    let mut view = counting_view(Arc::default(), &sink).with_favicons(fetcher);

    view.lookup("example.com");
    assert!(view.favicon_pending());
    assert!(view.wait_for_favicon(Duration::from_secs(5)));

    let icon = view.favicon().unwrap();
    assert_eq!((icon.width(), icon.height()), (32, 32));
    assert!(!view.favicon_pending());
}

#[test]
fn test_error_types_are_public() {
    fn describe(err: NetViewerError) -> String {
        match err {
            NetViewerError::NoCertificateData => "no data".to_string(),
            NetViewerError::OpenFailed { path, .. } => format!("open {}", path.display()),
            other => other.to_string(),
        }
    }

    assert_eq!(describe(NetViewerError::NoCertificateData), "no data");
    assert_eq!(describe("boom".into()), "boom");
}
