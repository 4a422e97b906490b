//! Best-effort favicon retrieval.
//!
//! Icons come from a favicon-by-domain service. Every failure ends as "no
//! icon"; the reason only reaches the failure sink.

use image::imageops::FilterType;
use image::RgbaImage;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::NetViewerError;
use crate::events::{FailureEvent, FailureSink};

pub const DEFAULT_ENDPOINT: &str = "https://www.google.com/s2/favicons";
pub const DEFAULT_REQUEST_SIZE: u32 = 64;
pub const DEFAULT_DISPLAY_SIZE: u32 = 32;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Where to fetch icons from and how to present them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconSettings {
    /// Service URL; `domain` and `sz` are appended as query parameters
    pub endpoint: String,
    /// Pixel size asked from the service
    pub request_size: u32,
    /// Bounding box the decoded icon is scaled into
    pub display_size: u32,
    pub timeout: Duration,
}

impl Default for FaviconSettings {
    fn default() -> Self {
        FaviconSettings {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_size: DEFAULT_REQUEST_SIZE,
            display_size: DEFAULT_DISPLAY_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A decoded icon scaled to the display size.
#[derive(Debug, Clone, PartialEq)]
pub struct Favicon {
    image: RgbaImage,
}

impl Favicon {
    /// Decodes an image payload and fits it into a `size`×`size` box.
    pub fn decode(bytes: &[u8], size: u32) -> Result<Favicon, NetViewerError> {
        let decoded = image::load_from_memory(bytes)?;
        let scaled = decoded.resize(size, size, FilterType::Lanczos3);
        Ok(Favicon {
            image: scaled.to_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }
}

#[derive(Debug, Clone)]
pub struct FaviconFetcher {
    settings: FaviconSettings,
    client: Client,
    sink: Arc<dyn FailureSink>,
}

impl FaviconFetcher {
    pub fn new(settings: FaviconSettings, sink: Arc<dyn FailureSink>) -> Result<Self, NetViewerError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(FaviconFetcher {
            settings,
            client,
            sink,
        })
    }

    pub fn settings(&self) -> &FaviconSettings {
        &self.settings
    }

    /// Fetches the icon for `domain`, or `None` on any failure.
    pub fn fetch(&self, domain: &str) -> Option<Favicon> {
        match self.try_fetch(domain) {
            Ok(favicon) => Some(favicon),
            Err(e) => {
                self.sink.report(FailureEvent::FaviconUnavailable {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn try_fetch(&self, domain: &str) -> Result<Favicon, NetViewerError> {
        let size = self.settings.request_size.to_string();
        let url = Url::parse_with_params(
            &self.settings.endpoint,
            &[("domain", domain), ("sz", size.as_str())],
        )
        .map_err(|e| NetViewerError::InvalidInput {
            field: "favicon.endpoint".to_string(),
            reason: e.to_string(),
        })?;

        debug!(%url, "fetching favicon");
        let response = self.client.get(url).send()?;
        if response.status() != StatusCode::OK {
            return Err(NetViewerError::Http {
                details: format!("unexpected status {}", response.status()),
            });
        }
        let bytes = response.bytes()?;
        Favicon::decode(&bytes, self.settings.display_size)
    }

    /// Runs [`fetch`](Self::fetch) on a worker thread.
    pub fn spawn(&self, domain: &str) -> FaviconTask {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let fetcher = self.clone();
        let worker_domain = domain.to_string();
        let worker_cancelled = Arc::clone(&cancelled);
        thread::spawn(move || {
            let favicon = fetcher.fetch(&worker_domain);
            if !worker_cancelled.load(Ordering::Acquire) {
                let _ = sender.send(favicon);
            }
        });

        FaviconTask {
            domain: domain.to_string(),
            receiver,
            cancelled,
        }
    }
}

/// Outcome of polling a [`FaviconTask`].
#[derive(Debug, PartialEq)]
pub enum FaviconPoll {
    Pending,
    Ready(Option<Favicon>),
}

/// Handle to a favicon fetch running in the background.
///
/// Dropping the handle cancels the task; a late result is discarded.
pub struct FaviconTask {
    domain: String,
    receiver: Receiver<Option<Favicon>>,
    cancelled: Arc<AtomicBool>,
}

impl FaviconTask {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Non-blocking check for a result.
    pub fn try_take(&self) -> FaviconPoll {
        if self.is_cancelled() {
            return FaviconPoll::Ready(None);
        }
        match self.receiver.try_recv() {
            Ok(favicon) => FaviconPoll::Ready(favicon),
            Err(TryRecvError::Empty) => FaviconPoll::Pending,
            Err(TryRecvError::Disconnected) => FaviconPoll::Ready(None),
        }
    }

    /// Blocks for at most `timeout` waiting for a result.
    pub fn wait(&self, timeout: Duration) -> FaviconPoll {
        if self.is_cancelled() {
            return FaviconPoll::Ready(None);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(favicon) => FaviconPoll::Ready(favicon),
            Err(RecvTimeoutError::Timeout) => FaviconPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => FaviconPoll::Ready(None),
        }
    }
}

impl Drop for FaviconTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
