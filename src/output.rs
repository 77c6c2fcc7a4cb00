//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what a page *is* (its title and address) and shows the
//! filesystem as secondary context on indented lines, so a listing reads as
//! a content inventory while still letting users trace data back to files.
//!
//! # Output Format
//!
//! ## Show
//!
//! ```text
//! Field notes
//!     Address: notes/field_trip
//!     Source: notes/field_trip.md
//!     Metadata: notes/meta/field_trip.meta
//! Breadcrumbs
//!     / → /
//!     notes → /notes
//!     field trip → /notes/field_trip
//!     prev → /notes/beach
//!     next
//! Children
//!     001 cliffs → /notes/field_trip/cliffs/
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 Home
//! 002 notes
//!     Index page not found.
//!
//! 2 pages, 1 warning
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::archive::PageReport;
use crate::classify::Listing;
use crate::metadata::{Command, Record};
use crate::page::Page;
use crate::types::{Crumb, Heading, Link};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn link_line(index: usize, link: &Link) -> String {
    format!("{}{} {} \u{2192} {}", indent(1), format_index(index), link.text, link.href)
}

fn crumb_line(crumb: &Crumb) -> String {
    match &crumb.href {
        Some(href) => format!("{}{} \u{2192} {}", indent(1), crumb.text, href),
        None => format!("{}{}", indent(1), crumb.text),
    }
}

fn link_section(lines: &mut Vec<String>, heading: &str, links: &[Link]) {
    if links.is_empty() {
        return;
    }
    lines.push(heading.to_string());
    for (i, link) in links.iter().enumerate() {
        lines.push(link_line(i + 1, link));
    }
}

/// Path relative to the docroot when possible.
fn display_path(docroot: &Path, path: &Path) -> String {
    path.strip_prefix(docroot)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Page
// ============================================================================

/// Format the resolved view of one page.
pub fn format_page(page: &Page) -> Vec<String> {
    let mut lines = vec![page.title()];
    let address = if page.is_root() { "(root)" } else { page.address() };
    lines.push(format!("{}Address: {}", indent(1), address));
    match page.file() {
        Some(file) => lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(page.docroot(), file)
        )),
        None => lines.push(format!("{}Source: (none)", indent(1))),
    }
    if let Some(metafile) = page.metadata().and_then(|m| m.metafile()) {
        lines.push(format!(
            "{}Metadata: {}",
            indent(1),
            display_path(page.docroot(), metafile)
        ));
    }

    lines.push("Breadcrumbs".to_string());
    for crumb in page.breadcrumbs() {
        lines.push(crumb_line(&crumb));
    }

    if let Some(children) = page.children() {
        link_section(&mut lines, "Children", &children);
    }
    if let Some(siblings) = page.siblings() {
        let links: Vec<Link> = siblings.iter().map(Page::link).collect();
        link_section(&mut lines, "Siblings", &links);
    }
    link_section(&mut lines, "Figures", page.unreferenced_figures());
    if let Some(documents) = page.documents() {
        link_section(&mut lines, "Documents", documents);
    }

    let headings = page.heading_index();
    if !headings.is_empty() {
        lines.push("Headings".to_string());
        for heading in headings {
            lines.push(format!("{}#{} {}", indent(1), heading.anchor, heading.text));
        }
    }

    if !page.warnings().is_empty() {
        lines.push("Warnings".to_string());
        for warning in page.warnings() {
            lines.push(format!("{}{}", indent(1), warning));
        }
    }
    lines
}

/// Print the page view to stdout.
pub fn print_page(page: &Page) {
    for line in format_page(page) {
        println!("{}", line);
    }
}

/// Serializable snapshot of a page for `--json` output.
#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub address: String,
    pub title: String,
    pub url: String,
    pub file: Option<String>,
    pub breadcrumbs: Vec<Crumb>,
    pub children: Option<Vec<Link>>,
    pub siblings: Option<Vec<Link>>,
    pub previous: Option<Link>,
    pub next: Option<Link>,
    pub unreferenced_figures: Vec<Link>,
    pub documents: Option<Vec<Link>>,
    pub headings: Vec<Heading>,
    pub warnings: Vec<String>,
}

impl PageSummary {
    pub fn from_page(page: &Page) -> Self {
        Self {
            address: page.address().to_string(),
            title: page.title(),
            url: page.url(),
            file: page.file().map(|f| f.display().to_string()),
            breadcrumbs: page.breadcrumbs(),
            children: page.children(),
            siblings: page
                .siblings()
                .map(|pages| pages.iter().map(Page::link).collect()),
            previous: page.previous(),
            next: page.next_page(),
            unreferenced_figures: page.unreferenced_figures().to_vec(),
            documents: page.documents().map(<[Link]>::to_vec),
            headings: page.heading_index().to_vec(),
            warnings: page.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}

// ============================================================================
// Directory listing
// ============================================================================

/// Format every non-empty bucket of a directory classification.
pub fn format_listing(listing: &Listing) -> Vec<String> {
    let mut lines = vec![listing.path.display().to_string()];
    for (name, entries) in listing.categories() {
        if entries.is_empty() || name == "all" {
            continue;
        }
        lines.push(format!("{}{} ({})", indent(1), name, entries.len()));
        for entry in entries {
            lines.push(format!("{}{}", indent(2), entry));
        }
    }
    lines
}

/// Print a directory classification to stdout.
pub fn print_listing(listing: &Listing) {
    for line in format_listing(listing) {
        println!("{}", line);
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Format the non-empty fields of a metadata record.
pub fn format_record(record: &Record) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in record.dublin_core() {
        if !value.is_empty() {
            lines.push(format!("{}: {}", key, value));
        }
    }
    for command in Command::ALL {
        if let Some(value) = record.command(command) {
            lines.push(format!("{}: {}", command.key(), value));
        }
    }
    for (key, value) in record.extra() {
        lines.push(format!("{}: {}", key, value));
    }
    if lines.is_empty() {
        lines.push("(no metadata)".to_string());
    }
    lines
}

/// Print a metadata record to stdout.
pub fn print_record(record: &Record) {
    for line in format_record(record) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format archive check results: one entry per page, problems indented,
/// then a summary line.
pub fn format_check(reports: &[PageReport]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut total_warnings = 0;
    for (i, report) in reports.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), report.title));
        for warning in &report.warnings {
            lines.push(format!("{}{}", indent(1), warning));
            total_warnings += 1;
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "{} {}, {} {}",
        reports.len(),
        if reports.len() == 1 { "page" } else { "pages" },
        total_warnings,
        if total_warnings == 1 { "warning" } else { "warnings" }
    ));
    lines
}

/// Print archive check results to stdout.
pub fn print_check(reports: &[PageReport]) {
    for line in format_check(reports) {
        println!("{}", line);
    }
}
