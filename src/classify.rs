//! Directory classification by filename suffix.
//!
//! A [`Listing`] sorts the entries of one directory into buckets. The page
//! resolver never looks at a directory any other way: children are the
//! paired directory's `page` bucket, figures its `figures` bucket, and so on.
//!
//! ## Classification rules
//!
//! Each entry lands in buckets by the first rule that applies:
//!
//! 1. Name starts with `.` → `hidden`
//! 2. Name ends with `~` → `temp`
//! 3. Entry is a directory → `dirs`
//! 4. Lower-cased extension is looked up in the suffix table. An entry is
//!    appended to *every* category listing its extension, or to `unknown`
//!    when none does.
//!
//! `all` holds the complete listing regardless of classification, and
//! `page` is the union of `text`, `markdown` and `html`, in listing order.

use crate::naming;
use crate::types::Link;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Suffix-table categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Markdown,
    Html,
    Figures,
    Documents,
    Data,
    Images,
    Meta,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Text,
        Category::Markdown,
        Category::Html,
        Category::Figures,
        Category::Documents,
        Category::Data,
        Category::Images,
        Category::Meta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Markdown => "markdown",
            Category::Html => "html",
            Category::Figures => "figures",
            Category::Documents => "documents",
            Category::Data => "data",
            Category::Images => "images",
            Category::Meta => "meta",
        }
    }

    /// Lower-case suffixes (with dot) belonging to this category.
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            Category::Text => &[".txt"],
            Category::Markdown => &[".md", ".mkd", ".markdown"],
            Category::Html => &[".html", ".htm", ".xhtml"],
            Category::Figures => &[".png", ".jpg", ".jpeg", ".gif", ".svg"],
            Category::Documents => &[".pdf"],
            Category::Data => &[".csv", ".data", ".dat"],
            Category::Images => &[
                ".3fr", ".ari", ".arw", ".bay", ".cap", ".cr2", ".crw", ".dcr", ".dcs", ".dng",
                ".drf", ".eip", ".erf", ".fff", ".iiq", ".k25", ".kdc", ".mdc", ".mef", ".mos",
                ".mrw", ".nef", ".nrw", ".orf", ".pef", ".ptx", ".pxn", ".r3d", ".raf", ".raw",
                ".rw2", ".rwl", ".rzw", ".sr2", ".srf", ".srw", ".tif", ".tiff", ".x3f",
            ],
            Category::Meta => &[".meta"],
        }
    }

    fn is_page(self) -> bool {
        matches!(self, Category::Text | Category::Markdown | Category::Html)
    }
}

/// Page suffixes in resolution priority order: plain text, markdown, HTML.
pub const PAGE_SUFFIXES: &[&str] = &[
    ".txt",
    ".md",
    ".mkd",
    ".markdown",
    ".html",
    ".htm",
    ".xhtml",
];

/// True when the filename's extension marks it as an HTML page, whose
/// content is served as-is.
pub fn is_html(name: &str) -> bool {
    Category::Html
        .suffixes()
        .contains(&naming::extension_lower(name).as_str())
}

/// Classified listing of one directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Listing {
    pub path: PathBuf,
    pub text: Vec<String>,
    pub markdown: Vec<String>,
    pub html: Vec<String>,
    pub figures: Vec<String>,
    pub documents: Vec<String>,
    pub data: Vec<String>,
    pub images: Vec<String>,
    pub meta: Vec<String>,
    pub page: Vec<String>,
    pub dirs: Vec<String>,
    pub hidden: Vec<String>,
    pub temp: Vec<String>,
    pub unknown: Vec<String>,
    pub all: Vec<String>,
}

impl Listing {
    /// Classify the entries of `dir`, sorted alphabetically when `sort` is set.
    pub fn read(dir: &Path, sort: bool) -> Result<Self, ClassifyError> {
        if !dir.is_dir() {
            return Err(ClassifyError::NotFound(dir.to_path_buf()));
        }
        let io_err = |source| ClassifyError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut all = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            all.push(entry.file_name().to_string_lossy().to_string());
        }
        if sort {
            all.sort();
        }

        let mut listing = Listing {
            path: dir.to_path_buf(),
            ..Default::default()
        };

        for name in &all {
            if name.starts_with('.') {
                listing.hidden.push(name.clone());
            } else if name.ends_with('~') {
                listing.temp.push(name.clone());
            } else if dir.join(name).is_dir() {
                listing.dirs.push(name.clone());
            } else {
                listing.classify_file(name);
            }
        }

        listing.all = all;
        Ok(listing)
    }

    fn classify_file(&mut self, name: &str) {
        let ext = naming::extension_lower(name);
        let mut found = false;
        let mut is_page = false;
        for category in Category::ALL {
            if category.suffixes().contains(&ext.as_str()) {
                self.bucket_mut(category).push(name.to_string());
                is_page |= category.is_page();
                found = true;
            }
        }
        if is_page {
            self.page.push(name.to_string());
        }
        if !found {
            self.unknown.push(name.to_string());
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Text => &mut self.text,
            Category::Markdown => &mut self.markdown,
            Category::Html => &mut self.html,
            Category::Figures => &mut self.figures,
            Category::Documents => &mut self.documents,
            Category::Data => &mut self.data,
            Category::Images => &mut self.images,
            Category::Meta => &mut self.meta,
        }
    }

    pub fn bucket(&self, category: Category) -> &[String] {
        match category {
            Category::Text => &self.text,
            Category::Markdown => &self.markdown,
            Category::Html => &self.html,
            Category::Figures => &self.figures,
            Category::Documents => &self.documents,
            Category::Data => &self.data,
            Category::Images => &self.images,
            Category::Meta => &self.meta,
        }
    }

    /// Every bucket as `(name, entries)`: suffix categories first, then the
    /// derived `page` union, then the synthetic buckets.
    pub fn categories(&self) -> Vec<(&'static str, &[String])> {
        let mut out: Vec<(&'static str, &[String])> = Category::ALL
            .iter()
            .map(|c| (c.name(), self.bucket(*c)))
            .collect();
        out.push(("page", &self.page));
        out.push(("dirs", &self.dirs));
        out.push(("hidden", &self.hidden));
        out.push(("temp", &self.temp));
        out.push(("unknown", &self.unknown));
        out.push(("all", &self.all));
        out
    }

    /// Links to the files of one category: `(base/entry, entry)`.
    pub fn links(&self, category: Category, base: &str) -> Vec<Link> {
        file_links(self.bucket(category), base)
    }

    /// Links to the pages of this directory: `(base/stem/, display title)`.
    pub fn page_links(&self, base: &str) -> Vec<Link> {
        self.page
            .iter()
            .map(|entry| {
                let name = naming::parse_file_name(entry);
                Link::new(
                    format!("{}/", naming::join_url(base, &name.stem)),
                    name.display_title,
                )
            })
            .collect()
    }

    /// First page entry whose stem equals `stem`.
    pub fn find_page(&self, stem: &str) -> Option<&str> {
        self.page
            .iter()
            .find(|entry| naming::stem(entry) == stem)
            .map(String::as_str)
    }
}

/// `(base/entry, entry)` links for a list of filenames.
pub fn file_links(entries: &[String], base: &str) -> Vec<Link> {
    entries
        .iter()
        .map(|entry| Link::new(naming::join_url(base, entry), entry.clone()))
        .collect()
}
