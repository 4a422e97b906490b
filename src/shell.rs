//! Sidebar navigation between tool pages.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::view::CertificateLookupView;

/// Tools offered in the sidebar, in display order.
#[derive(
    Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[strum(serialize = "dns", to_string = "DNS Lookup")]
    Dns,
    #[strum(serialize = "ssl", to_string = "SSL Certificate")]
    Ssl,
    #[strum(serialize = "ip", to_string = "IP Information")]
    Ip,
}

impl ToolKind {
    /// Position in the sidebar.
    pub fn index(&self) -> usize {
        ToolKind::iter().position(|kind| kind == *self).unwrap_or(0)
    }
}

/// Content of one page.
pub enum ToolPage {
    /// Not built yet; renders an empty page.
    Placeholder(ToolKind),
    Certificate(Box<CertificateLookupView>),
}

impl ToolPage {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolPage::Placeholder(kind) => *kind,
            ToolPage::Certificate(_) => ToolKind::Ssl,
        }
    }

    fn dismiss(&mut self) {
        if let ToolPage::Certificate(view) = self {
            view.dismiss();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub kind: ToolKind,
    pub label: String,
    pub selected: bool,
}

/// Top-level window model: a fixed list of pages and the selected index.
pub struct ApplicationShell {
    pages: Vec<ToolPage>,
    current: usize,
}

impl ApplicationShell {
    /// Builds the DNS, SSL and IP pages around `certificate_view`.
    pub fn new(certificate_view: CertificateLookupView) -> Self {
        let mut certificate_view = Some(Box::new(certificate_view));
        let pages = ToolKind::iter()
            .map(|kind| match kind {
                ToolKind::Ssl => certificate_view
                    .take()
                    .map(ToolPage::Certificate)
                    .unwrap_or(ToolPage::Placeholder(kind)),
                _ => ToolPage::Placeholder(kind),
            })
            .collect();
        ApplicationShell { pages, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Shows page `index`. Out-of-range indices are ignored.
    pub fn select_tool(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            debug!(index, "ignoring out-of-range tool selection");
            return false;
        }
        if index != self.current {
            self.pages[self.current].dismiss();
            self.current = index;
        }
        debug!(tool = %self.pages[index].kind(), "tool selected");
        true
    }

    pub fn select_kind(&mut self, kind: ToolKind) -> bool {
        match self.pages.iter().position(|page| page.kind() == kind) {
            Some(index) => self.select_tool(index),
            None => false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> &ToolPage {
        &self.pages[self.current]
    }

    pub fn current_page_mut(&mut self) -> &mut ToolPage {
        &mut self.pages[self.current]
    }

    pub fn certificate_view(&self) -> Option<&CertificateLookupView> {
        self.pages.iter().find_map(|page| match page {
            ToolPage::Certificate(view) => Some(view.as_ref()),
            _ => None,
        })
    }

    pub fn certificate_view_mut(&mut self) -> Option<&mut CertificateLookupView> {
        self.pages.iter_mut().find_map(|page| match page {
            ToolPage::Certificate(view) => Some(view.as_mut()),
            _ => None,
        })
    }

    /// Sidebar entries; exactly one is selected.
    pub fn sidebar(&self) -> Vec<SidebarEntry> {
        self.pages
            .iter()
            .enumerate()
            .map(|(index, page)| SidebarEntry {
                kind: page.kind(),
                label: page.kind().to_string(),
                selected: index == self.current,
            })
            .collect()
    }
}
