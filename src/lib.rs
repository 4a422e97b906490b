//! NetViewer: network tools behind a sidebar.
//!
//! The SSL certificate page is the one that does real work. It looks up
//! certificate metadata for a domain, renders it as a fixed field grid,
//! fetches the site favicon in the background, and can drop a renewal
//! reminder into the user's calendar.
//!
//! ```no_run
//! use std::sync::Arc;
//! use netviewer::{CertificateLookupView, OpensslProvider, TracingSink};
//!
//! let mut view = CertificateLookupView::new(
//!     Box::new(OpensslProvider::default()),
//!     Arc::new(TracingSink),
//! );
//! view.lookup("example.com");
//! for row in view.panel().rows() {
//!     println!("{}: {}", row.label, row.value);
//! }
//! ```

pub mod certificate;
pub mod config;
pub mod dates;
pub mod error;
pub mod events;
pub mod favicon;
pub mod opener;
pub mod reminder;
pub mod render;
pub mod shell;
pub mod view;

pub use certificate::{CertificateInfo, CertificateProvider, OpensslProvider, Target};
pub use error::NetViewerError;
pub use events::{FailureEvent, FailureSink, RecordingSink, TracingSink};
pub use favicon::{Favicon, FaviconFetcher, FaviconSettings};
pub use opener::{NoopOpener, OpenWithDefaultApplication, SystemOpener};
pub use reminder::{ReminderEvent, ReminderEventBuilder};
pub use shell::{ApplicationShell, ToolKind};
pub use view::{CertificateLookupView, FieldRow, ResultPanel};
