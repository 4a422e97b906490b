//! Terminal rendering of the shell and the certificate page.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fmt::Write;
use strum_macros::{Display, EnumString};

use crate::favicon::Favicon;
use crate::shell::{ApplicationShell, ToolPage};
use crate::view::{CertificateLookupView, FieldRow, ReminderAction, ResultPanel};

#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    Table,
    Json,
}

/// JSON shape of a lookup result.
#[derive(Debug, Serialize)]
pub struct LookupReport<'a> {
    pub domain: Option<&'a str>,
    pub fields: &'a [FieldRow],
    pub error: Option<&'a str>,
    pub reminder: Option<&'a ReminderAction>,
    pub favicon: Option<[u32; 2]>,
}

impl<'a> LookupReport<'a> {
    pub fn new(view: &'a CertificateLookupView) -> Self {
        LookupReport {
            domain: view.domain(),
            fields: view.panel().rows(),
            error: view.panel().error_line(),
            reminder: view.panel().reminder(),
            favicon: view.favicon().map(|icon| [icon.width(), icon.height()]),
        }
    }
}

pub fn render_json(view: &CertificateLookupView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&LookupReport::new(view))
}

pub fn render_sidebar(shell: &ApplicationShell) -> String {
    shell
        .sidebar()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let marker = if entry.selected { '>' } else { ' ' };
            format!("{} /{} {}", marker, index + 1, entry.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The visible page below the sidebar.
pub fn render_page(shell: &ApplicationShell) -> String {
    match shell.current_page() {
        ToolPage::Placeholder(kind) => format!("{}\n\n(this tool is not available yet)", kind),
        ToolPage::Certificate(view) => render_certificate(view),
    }
}

pub fn render_certificate(view: &CertificateLookupView) -> String {
    let mut out = String::new();
    let domain = view.domain().unwrap_or("Enter domain (e.g., example.com)");
    match view.favicon() {
        Some(icon) => {
            let _ = writeln!(out, "{}", favicon_ansi(icon));
            let _ = writeln!(out, "{}", domain);
        }
        None => {
            let _ = writeln!(out, "{}", domain);
        }
    }

    match view.panel() {
        ResultPanel::Hidden => {}
        ResultPanel::Error(line) => {
            let _ = writeln!(out, "{}", line);
        }
        ResultPanel::Certificate { rows, reminder } => {
            let _ = writeln!(out, "{}", field_table(rows));
            if reminder.is_some() {
                let _ = writeln!(out, "[Add Renewal Reminder]  (/remind)");
            }
        }
    }
    out.trim_end().to_string()
}

pub fn field_table(rows: &[FieldRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.label).fg(Color::DarkGrey),
            Cell::new(&row.value).add_attribute(Attribute::Bold),
        ]);
    }
    table
}

/// Draws the icon with upper-half blocks, two pixel rows per text line.
pub fn favicon_ansi(icon: &Favicon) -> String {
    let pixels = icon.pixels();
    let mut out = String::new();
    for y in (0..pixels.height()).step_by(2) {
        for x in 0..pixels.width() {
            let top = pixels.get_pixel(x, y);
            let bottom = if y + 1 < pixels.height() {
                *pixels.get_pixel(x, y + 1)
            } else {
                image::Rgba([0, 0, 0, 0])
            };
            let _ = write!(
                out,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                top[0], top[1], top[2], bottom[0], bottom[1], bottom[2]
            );
        }
        out.push_str("\x1b[0m\n");
    }
    out.trim_end_matches('\n').to_string()
}
