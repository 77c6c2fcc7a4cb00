//! Whole-archive traversal.
//!
//! Walks a docroot and lists the address of every page file in it, then
//! resolves each one to collect what went wrong. Hidden entries (and
//! everything below a hidden directory) and editor temp files are skipped.
//! A page stored under several suffixes (`note.txt` and `note.md`) yields a
//! single address, since resolution only ever picks one of them.

use crate::classify::PAGE_SUFFIXES;
use crate::config::ArchiveConfig;
use crate::naming;
use crate::page::{Page, PageError, Warning};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    DocrootNotFound(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Page error: {0}")]
    Page(#[from] PageError),
}

/// Outcome of resolving one page during a check.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub address: String,
    pub title: String,
    pub file: Option<PathBuf>,
    /// Warnings other than the routine missing paired directory.
    pub warnings: Vec<Warning>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn page_address(docroot: &Path, path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    if name.ends_with('~') {
        return None;
    }
    let parsed = naming::parse_file_name(&name);
    if !PAGE_SUFFIXES.contains(&parsed.extension.to_lowercase().as_str()) {
        return None;
    }

    let dir = path.parent()?.strip_prefix(docroot).ok()?;
    let mut segments: Vec<String> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    segments.push(parsed.stem);
    let address = segments.join("/");
    Some(if address == "index" {
        String::new()
    } else {
        address
    })
}

/// Every page address under `docroot`, sorted.
/// The root page is the empty address.
pub fn page_addresses(docroot: &Path) -> Result<Vec<String>, ArchiveError> {
    if !docroot.is_dir() {
        return Err(ArchiveError::DocrootNotFound(docroot.to_path_buf()));
    }

    let mut addresses: Vec<String> = Vec::new();
    let walker = WalkDir::new(docroot)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(address) = page_address(docroot, entry.path()) {
            log::debug!("found page '{address}'");
            addresses.push(address);
        }
    }
    addresses.sort();
    addresses.dedup();
    Ok(addresses)
}

/// Resolve every page of the archive and report each one.
pub fn check(docroot: &Path, config: Rc<ArchiveConfig>) -> Result<Vec<PageReport>, ArchiveError> {
    let mut reports = Vec::new();
    for address in page_addresses(docroot)? {
        let page = Page::with_config(docroot, &address, Rc::clone(&config))?;
        let warnings = page
            .warnings()
            .iter()
            .filter(|w| !w.is_routine())
            .cloned()
            .collect();
        reports.push(PageReport {
            title: page.title(),
            file: page.file().map(Path::to_path_buf),
            warnings,
            address,
        });
    }
    Ok(reports)
}
