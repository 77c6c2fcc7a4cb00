//! Page resolution.
//!
//! A [`Page`] is built from a docroot and an address and answers every
//! question a view needs: its content, title, breadcrumbs, children,
//! siblings, neighbours and documents.
//!
//! ## Addresses and directories
//!
//! An address is a slash path relative to the docroot with the file suffix
//! left off. For the address `notes/trips/coast`:
//!
//! ```text
//! archive/                     # docroot
//! └── notes/
//!     └── trips/               # parent directory: lists the page file
//!         ├── coast.md         # the page
//!         ├── coast.meta       # its metadata sidecar
//!         └── coast/           # paired directory: children, figures, documents
//!             ├── cliffs.md
//!             ├── map.pdf
//!             └── gannets.jpg
//! ```
//!
//! The empty address, or `index`, is the root page. Its parent and paired
//! directories are both the docroot and its file is the docroot's `index`
//! page.
//!
//! ## Construction
//!
//! Only a missing docroot fails construction. Everything else that can go
//! wrong while resolving (a missing parent or paired directory, no page
//! file, an unreadable file or sidecar) is recorded as a [`Warning`] on the
//! page and logged, and the page still renders: content falls back to a
//! placeholder heading so navigation keeps working for a missing page.
//!
//! ## Laziness
//!
//! Directory classification, file resolution, the file read and metadata
//! happen on construction. Rendered content, the parent page, siblings and
//! documents are computed on first access and kept for the life of the
//! page. Pages are cheap one-shot values meant to live for one request.

use crate::classify::{self, Listing, PAGE_SUFFIXES};
use crate::config::ArchiveConfig;
use crate::figures::{self, Resolved};
use crate::metadata::{MetadataError, PageMetadata, Record};
use crate::naming;
use crate::render;
use crate::types::{Crumb, Heading, Link};
use maud::html;
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Text shown as the title of a page with nothing to derive one from.
pub const UNKNOWN_TITLE: &str = "Title unknown";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Archive not found: {0}")]
    DocrootNotFound(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

impl PageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A recoverable problem met while resolving a page.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    #[error("Parent directory not found: {}", .0.display())]
    ParentDirectoryNotFound(PathBuf),
    #[error("No paired directory: {}", .0.display())]
    NoPairedDirectory(PathBuf),
    #[error("Page not found: {0}")]
    PageNotFound(String),
    #[error("Index page not found.")]
    IndexNotFound,
    #[error("Metadata unreadable: {0}")]
    MetadataUnreadable(String),
}

impl Warning {
    /// A leaf page without a paired directory is the common case, not a
    /// problem worth reporting.
    pub fn is_routine(&self) -> bool {
        matches!(self, Warning::NoPairedDirectory(_))
    }
}

fn note(warnings: &mut Vec<Warning>, warning: Warning) {
    if warning.is_routine() {
        log::debug!("{warning}");
    } else {
        log::warn!("{warning}");
    }
    warnings.push(warning);
}

/// Changes applied by [`Page::save`].
#[derive(Debug, Clone, Default)]
pub struct PageUpdate {
    /// New page text. `None` leaves the file untouched.
    pub content: Option<String>,
    /// Rename: the page moves to `<parent>/<slug><suffix>`.
    pub new_filename: Option<String>,
    /// Metadata form fields (`dc_title`, `sort`, …). When empty the current
    /// record is saved unchanged.
    pub fields: Vec<(String, String)>,
}

/// A file uploaded into the paired directory.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side name. Only the final path component is used.
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct RenderedPage {
    html: String,
    unreferenced: Vec<Link>,
    headings: Vec<Heading>,
}

/// One resolved page.
#[derive(Debug)]
pub struct Page {
    docroot: PathBuf,
    address: String,
    config: Rc<ArchiveConfig>,
    parent_dir: PathBuf,
    paired_dir: PathBuf,
    parent_listing: Option<Rc<Listing>>,
    paired_listing: Option<Rc<Listing>>,
    file: Option<PathBuf>,
    raw: Option<String>,
    metadata: Option<PageMetadata>,
    warnings: Vec<Warning>,
    rendered: OnceCell<RenderedPage>,
    parent: OnceCell<Option<Box<Page>>>,
    siblings: OnceCell<Option<Vec<Page>>>,
    documents: OnceCell<Option<Vec<Link>>>,
}

/// Strip one trailing `/` and any leading ones; `index` names the root.
pub fn normalize_address(address: &str) -> String {
    let address = address.strip_suffix('/').unwrap_or(address);
    let address = address.trim_start_matches('/');
    if address == "index" {
        String::new()
    } else {
        address.to_string()
    }
}

/// `(all but the last segment, last segment)` of an address.
fn split_address(address: &str) -> (&str, &str) {
    address.rsplit_once('/').unwrap_or(("", address))
}

fn join_address(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

fn dir_for(docroot: &Path, address: &str) -> PathBuf {
    if address.is_empty() {
        docroot.to_path_buf()
    } else {
        docroot.join(address)
    }
}

fn read_listing(dir: &Path, sort: bool) -> Option<Rc<Listing>> {
    match Listing::read(dir, sort) {
        Ok(listing) => Some(Rc::new(listing)),
        Err(e) => {
            log::debug!("{e}");
            None
        }
    }
}

/// Find the file behind an address: the first `docroot/address + suffix`
/// that exists, else the parent directory's `index` page. The flag is set
/// when the index fallback was taken.
fn resolve_file(
    docroot: &Path,
    address: &str,
    parent_dir: &Path,
    parent_listing: Option<&Listing>,
) -> Option<(PathBuf, bool)> {
    if !address.is_empty() {
        for suffix in PAGE_SUFFIXES {
            let candidate = docroot.join(format!("{address}{suffix}"));
            if candidate.is_file() {
                return Some((candidate, false));
            }
        }
    }
    let entry = parent_listing?.find_page("index")?;
    Some((parent_dir.join(entry), true))
}

impl Page {
    /// Resolve `address` under `docroot` with default settings and the given
    /// URL prefixes.
    pub fn open(
        docroot: impl AsRef<Path>,
        address: &str,
        base_url: &str,
        static_root: &str,
    ) -> Result<Self, PageError> {
        let config = ArchiveConfig::with_urls(base_url, static_root);
        Self::with_config(docroot, address, Rc::new(config))
    }

    /// Resolve `address` under `docroot` with a loaded archive configuration.
    pub fn with_config(
        docroot: impl AsRef<Path>,
        address: &str,
        config: Rc<ArchiveConfig>,
    ) -> Result<Self, PageError> {
        let docroot = docroot.as_ref();
        if !docroot.is_dir() {
            return Err(PageError::DocrootNotFound(docroot.to_path_buf()));
        }
        let docroot = docroot.to_path_buf();
        let address = normalize_address(address);
        log::debug!("resolving '{}' under {}", address, docroot.display());

        let (parent_dir, paired_dir) = if address.is_empty() {
            (docroot.clone(), docroot.clone())
        } else {
            let (parent_address, _) = split_address(&address);
            (dir_for(&docroot, parent_address), dir_for(&docroot, &address))
        };

        let mut warnings = Vec::new();
        let parent_listing = read_listing(&parent_dir, config.sort_listings);
        if parent_listing.is_none() {
            note(
                &mut warnings,
                Warning::ParentDirectoryNotFound(parent_dir.clone()),
            );
        }
        let paired_listing = if paired_dir == parent_dir {
            parent_listing.clone()
        } else {
            let listing = read_listing(&paired_dir, config.sort_listings);
            if listing.is_none() {
                note(&mut warnings, Warning::NoPairedDirectory(paired_dir.clone()));
            }
            listing
        };

        let resolved = resolve_file(
            &docroot,
            &address,
            &parent_dir,
            parent_listing.as_deref(),
        );
        let raw = match &resolved {
            Some((path, via_index)) => match fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::debug!("reading {}: {e}", path.display());
                    let warning = if *via_index {
                        Warning::IndexNotFound
                    } else {
                        Warning::PageNotFound(address.clone())
                    };
                    note(&mut warnings, warning);
                    None
                }
            },
            None => {
                let warning = if address.is_empty() {
                    Warning::IndexNotFound
                } else {
                    Warning::PageNotFound(address.clone())
                };
                note(&mut warnings, warning);
                None
            }
        };
        let file = resolved.map(|(path, _)| path);

        let metadata = file.as_ref().map(|path| match PageMetadata::load(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                note(&mut warnings, Warning::MetadataUnreadable(e.to_string()));
                PageMetadata::empty(path)
            }
        });

        Ok(Self {
            docroot,
            address,
            config,
            parent_dir,
            paired_dir,
            parent_listing,
            paired_listing,
            file,
            raw,
            metadata,
            warnings,
            rendered: OnceCell::new(),
            parent: OnceCell::new(),
            siblings: OnceCell::new(),
            documents: OnceCell::new(),
        })
    }

    // =========================================================================
    // Resolution state
    // =========================================================================

    pub fn docroot(&self) -> &Path {
        &self.docroot
    }

    /// Normalized address; empty for the root page.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_root(&self) -> bool {
        self.address.is_empty()
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn parent_dir(&self) -> &Path {
        &self.parent_dir
    }

    pub fn paired_dir(&self) -> &Path {
        &self.paired_dir
    }

    pub fn parent_listing(&self) -> Option<&Listing> {
        self.parent_listing.as_deref()
    }

    pub fn paired_listing(&self) -> Option<&Listing> {
        self.paired_listing.as_deref()
    }

    /// The file backing this page, if one resolved.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Unrendered file text, if the file could be read.
    pub fn raw_content(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn metadata(&self) -> Option<&PageMetadata> {
        self.metadata.as_ref()
    }

    pub fn record(&self) -> Option<&Record> {
        self.metadata.as_ref().map(PageMetadata::record)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    fn parent_address(&self) -> &str {
        split_address(&self.address).0
    }

    fn last_segment(&self) -> &str {
        split_address(&self.address).1
    }

    fn file_name(&self) -> Option<String> {
        let name = self.file.as_ref()?.file_name()?;
        Some(name.to_string_lossy().to_string())
    }

    fn sorts_reverse(&self) -> bool {
        self.record().is_some_and(Record::sorts_reverse)
    }

    /// URL prefix for files of the paired directory.
    fn static_prefix(&self) -> String {
        naming::join_url_all(&[
            &self.config.static_root,
            self.config.base_url.trim_start_matches('/'),
            &self.address,
        ])
    }

    // =========================================================================
    // Content
    // =========================================================================

    fn rendered(&self) -> &RenderedPage {
        self.rendered.get_or_init(|| self.render())
    }

    fn render(&self) -> RenderedPage {
        let (Some(name), Some(raw)) = (self.file_name(), self.raw.as_ref()) else {
            return RenderedPage {
                html: self.placeholder(),
                ..RenderedPage::default()
            };
        };
        if classify::is_html(&name) {
            return RenderedPage {
                html: raw.clone(),
                ..RenderedPage::default()
            };
        }

        let prefix = self.static_prefix();
        let Resolved { text, unreferenced } = match &self.paired_listing {
            Some(listing) if !listing.figures.is_empty() => {
                figures::resolve(raw, &prefix, &listing.figures)
            }
            _ => Resolved {
                text: raw.clone(),
                unreferenced: Vec::new(),
            },
        };
        let title = naming::display_title(&naming::stem(&name));
        let markdown = render::markdown_to_html(&text, &title);

        RenderedPage {
            html: markdown.html,
            unreferenced,
            headings: markdown.headings,
        }
    }

    fn placeholder(&self) -> String {
        let markup = if self.is_root() {
            html! { h1 { "Index " (self.config.base_url) } }
        } else {
            html! { h1 { "No file found " (self.address) } }
        };
        markup.into_string()
    }

    /// Rendered HTML of the page, or a placeholder heading when it has no
    /// readable file. HTML files are returned as they are.
    pub fn content(&self) -> &str {
        &self.rendered().html
    }

    /// Figures of the paired directory the page text does not show.
    pub fn unreferenced_figures(&self) -> &[Link] {
        &self.rendered().unreferenced
    }

    /// `(anchor, text)` of every `h2`-`h4` in the rendered content.
    pub fn heading_index(&self) -> &[Heading] {
        &self.rendered().headings
    }

    pub fn title(&self) -> String {
        if let Some(title) = self.record().map(Record::title) {
            if !title.is_empty() {
                return title;
            }
        }
        if let Some(name) = self.file_name() {
            return naming::display_title(&naming::stem(&name));
        }
        let last = self.last_segment();
        if !last.is_empty() {
            return naming::display_title(last);
        }
        UNKNOWN_TITLE.to_string()
    }

    pub fn word_count(&self) -> usize {
        self.raw
            .as_deref()
            .map(|text| text.split_whitespace().count())
            .unwrap_or(0)
    }

    /// Lower-cased word → occurrence count over the raw page text.
    pub fn concordance(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for word in self.raw.as_deref().unwrap_or_default().split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if !word.is_empty() {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Metadata form fields plus the raw `content`, for an edit form.
    pub fn form_data(&self) -> BTreeMap<String, String> {
        let mut data = match self.record() {
            Some(record) => record.form_fields(),
            None => Record::default().form_fields(),
        };
        data.insert(
            "content".to_string(),
            self.raw.clone().unwrap_or_default(),
        );
        data
    }

    /// Licence link for the page's rights element.
    pub fn rights_markup(&self) -> Option<String> {
        self.record()?.rights_markup(&self.config.licenses)
    }

    // =========================================================================
    // Links
    // =========================================================================

    pub fn url(&self) -> String {
        naming::join_url(&self.config.base_url, &self.address)
    }

    pub fn link(&self) -> Link {
        Link::new(self.url(), self.title())
    }

    /// The url prefix, one crumb per address segment, then `prev` / `next`.
    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        let base = &self.config.base_url;
        let mut crumbs = vec![Crumb {
            href: Some(base.clone()),
            text: base.clone(),
        }];
        let mut href = base.clone();
        for segment in self.address.split('/').filter(|s| !s.is_empty()) {
            href = naming::join_url(&href, segment);
            crumbs.push(Crumb {
                href: Some(href.clone()),
                text: naming::display_title(segment),
            });
        }
        crumbs.push(Crumb {
            href: self.previous().map(|l| l.href),
            text: "prev".to_string(),
        });
        crumbs.push(Crumb {
            href: self.next_page().map(|l| l.href),
            text: "next".to_string(),
        });
        crumbs
    }

    fn neighbour(&self, offset: isize) -> Option<Link> {
        let listing = self.parent_listing.as_ref()?;
        let name = self.file_name()?;
        let pos = listing.page.iter().position(|entry| *entry == name)?;
        let entry = listing.page.get(pos.checked_add_signed(offset)?)?;
        let stem = naming::stem(entry);
        let href = naming::join_url_all(&[&self.config.base_url, self.parent_address(), &stem]);
        Some(Link::new(href, stem))
    }

    /// The page listed before this one in the parent directory.
    pub fn previous(&self) -> Option<Link> {
        self.neighbour(-1)
    }

    /// The page listed after this one in the parent directory.
    pub fn next_page(&self) -> Option<Link> {
        self.neighbour(1)
    }

    /// Pages of the paired directory, without its `index` page.
    pub fn children(&self) -> Option<Vec<Link>> {
        let listing = self.paired_listing.as_ref()?;
        let base = self.url();
        let mut links: Vec<Link> = listing
            .page
            .iter()
            .zip(listing.page_links(&base))
            .filter(|(entry, _)| !naming::stem(entry).eq_ignore_ascii_case("index"))
            .map(|(_, link)| link)
            .collect();
        if self.sorts_reverse() {
            links.sort_by(|a, b| b.cmp(a));
        }
        Some(links)
    }

    /// The page whose paired directory holds this one. `None` for the root.
    pub fn parent(&self) -> Option<&Page> {
        self.parent
            .get_or_init(|| {
                if self.is_root() {
                    return None;
                }
                let config = Rc::clone(&self.config);
                match Page::with_config(&self.docroot, self.parent_address(), config) {
                    Ok(page) => Some(Box::new(page)),
                    Err(e) => {
                        log::warn!("parent of '{}': {e}", self.address);
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Link up one level: the index for top-level pages.
    pub fn parent_link(&self) -> Option<Link> {
        if self.is_root() {
            return None;
        }
        let parent_address = self.parent_address();
        if parent_address.is_empty() {
            return Some(Link::new(self.config.base_url.clone(), "Index"));
        }
        let (_, last) = split_address(parent_address);
        Some(Link::new(
            naming::join_url(&self.config.base_url, parent_address),
            naming::display_title(last),
        ))
    }

    fn sibling_stems(&self) -> Option<Vec<String>> {
        if self.is_root() {
            return None;
        }
        let listing = self.parent_listing.as_ref()?;
        Some(listing.page.iter().map(|entry| naming::stem(entry)).collect())
    }

    fn parent_sorts_reverse(&self) -> bool {
        self.parent().is_some_and(Page::sorts_reverse)
    }

    /// Every other page of the parent directory, each fully resolved.
    /// Ordered by the parent page's sort directive.
    pub fn siblings(&self) -> Option<&[Page]> {
        self.siblings
            .get_or_init(|| {
                let own = self.last_segment();
                let mut pages: Vec<Page> = self
                    .sibling_stems()?
                    .into_iter()
                    .filter(|stem| stem != own)
                    .filter_map(|stem| {
                        let address = join_address(self.parent_address(), &stem);
                        match Page::with_config(&self.docroot, &address, Rc::clone(&self.config)) {
                            Ok(page) => Some(page),
                            Err(e) => {
                                log::warn!("sibling '{address}': {e}");
                                None
                            }
                        }
                    })
                    .collect();
                if self.parent_sorts_reverse() {
                    pages.sort_by(|a, b| b.address.cmp(&a.address));
                }
                Some(pages)
            })
            .as_deref()
    }

    /// The parent directory's pages as links, the page itself unlinked and
    /// the `index` page left out.
    pub fn sibling_links(&self) -> Option<Vec<Crumb>> {
        let own = self.last_segment();
        let mut crumbs: Vec<Crumb> = self
            .sibling_stems()?
            .into_iter()
            .filter(|stem| !stem.eq_ignore_ascii_case("index"))
            .map(|stem| {
                let href = (stem != own).then(|| {
                    naming::join_url_all(&[&self.config.base_url, self.parent_address(), &stem])
                });
                Crumb {
                    href,
                    text: naming::display_title(&stem),
                }
            })
            .collect();
        if self.parent_sorts_reverse() {
            crumbs.reverse();
        }
        Some(crumbs)
    }

    /// PDF documents of the paired directory.
    pub fn documents(&self) -> Option<&[Link]> {
        self.documents
            .get_or_init(|| {
                let listing = self.paired_listing.as_ref()?;
                Some(classify::file_links(&listing.documents, &self.static_prefix()))
            })
            .as_deref()
    }

    /// The paired directory's figure named `thumbnail.*`.
    pub fn thumbnail(&self) -> Option<Link> {
        let listing = self.paired_listing.as_ref()?;
        let entry = listing
            .figures
            .iter()
            .find(|entry| naming::stem(entry) == "thumbnail")?;
        Some(Link::new(
            naming::join_url(&self.static_prefix(), entry),
            entry.clone(),
        ))
    }

    // =========================================================================
    // Writing
    // =========================================================================

    fn new_file_path(&self) -> PathBuf {
        let suffix = &self.config.new_page_suffix;
        if self.is_root() {
            self.docroot.join(format!("index{suffix}"))
        } else {
            self.docroot.join(format!("{}{}", self.address, suffix))
        }
    }

    /// Write an update to disk.
    ///
    /// A rename switches the page to `<parent>/<slug><suffix>` (the old file
    /// is left in place). Content overwrites the page file, which for a page
    /// that had none is `docroot/address` plus the configured suffix. The
    /// paired directory is created when missing so children and uploads have
    /// somewhere to go. The metadata record is saved last. Writes are not
    /// atomic and nothing is rolled back when one fails.
    pub fn save(&mut self, update: &PageUpdate, uploads: &[Upload]) -> Result<(), PageError> {
        let new_name = update
            .new_filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if let Some(name) = new_name {
            let suffix = self
                .file_name()
                .map(|n| naming::parse_file_name(&n).extension)
                .filter(|ext| !ext.is_empty())
                .unwrap_or_else(|| self.config.new_page_suffix.clone());
            let target = self
                .parent_dir
                .join(format!("{}{}", naming::slugify(name), suffix));
            log::info!("renaming '{}' to {}", self.address, target.display());
            self.file = Some(target);
        }
        let target = match &self.file {
            Some(file) => file.clone(),
            None => self.new_file_path(),
        };
        self.file = Some(target.clone());

        if let Some(content) = &update.content {
            if let Some(dir) = target.parent().filter(|d| !d.is_dir()) {
                fs::create_dir_all(dir).map_err(|e| PageError::io(dir, e))?;
            }
            fs::write(&target, content).map_err(|e| PageError::io(&target, e))?;
            self.raw = Some(content.clone());
        }

        if !self.paired_dir.is_dir() {
            log::info!("creating paired directory {}", self.paired_dir.display());
            fs::create_dir_all(&self.paired_dir)
                .map_err(|e| PageError::io(&self.paired_dir, e))?;
        }

        for upload in uploads {
            let Some(name) = Path::new(&upload.filename).file_name() else {
                log::warn!("skipping upload without a file name: {:?}", upload.filename);
                continue;
            };
            let dest = self.paired_dir.join(name);
            fs::write(&dest, &upload.data).map_err(|e| PageError::io(&dest, e))?;
        }

        let mut metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => PageMetadata::load(&target)?,
        };
        if !update.fields.is_empty() {
            let mut record = Record::from_fields(update.fields.iter().map(|(k, v)| (k, v)));
            record.retain_extra_from(metadata.record());
            metadata.set_record(record);
        }
        let saved = metadata.save(new_name);
        self.metadata = Some(metadata);
        saved?;

        self.rendered = OnceCell::new();
        Ok(())
    }
}
