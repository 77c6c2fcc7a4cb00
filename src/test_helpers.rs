//! Shared test utilities for the flatnote test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let page = open_page(tmp.path(), "notes/field_trip");
//! assert_eq!(page.title(), "Field notes");
//! assert_link_texts(&page.children().unwrap(), &["tide tables"]);
//! ```
//!
//! The fixture archive looks like this:
//!
//! ```text
//! fixtures/archive/
//! ├── index.md                 # root page, tags harbour.jpg
//! ├── harbour.jpg
//! ├── lighthouse.png           # never tagged
//! ├── about.html
//! ├── notes.md                 # no h1
//! ├── notes.meta               # title Notebook, sort: reverse
//! └── notes/
//!     ├── beach.txt
//!     ├── field_trip.md
//!     ├── meta/field_trip.meta
//!     ├── zoology.md
//!     └── field_trip/
//!         ├── cliffs.jpg, gannets.jpg, thumbnail.png, map.pdf
//!         └── tide_tables.txt
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::page::Page;
use crate::types::Link;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/archive/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/archive");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `text` to `root/rel`, creating directories on the way.
pub fn write_file(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// Open a page with the stock URL prefixes (`/` and `/static/`).
pub fn open_page(root: &Path, address: &str) -> Page {
    Page::open(root, address, "/", "/static/")
        .unwrap_or_else(|e| panic!("page '{address}' failed to open: {e}"))
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the texts of a link list, in order.
pub fn assert_link_texts(links: &[Link], expected: &[&str]) {
    let texts: Vec<&str> = links.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, expected, "link texts differ");
}

/// Assert the addresses of a page list, in order.
pub fn assert_addresses(pages: &[Page], expected: &[&str]) {
    let addresses: Vec<&str> = pages.iter().map(Page::address).collect();
    assert_eq!(addresses, expected, "page addresses differ");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_copy_whole_tree() {
        let tmp = setup_fixtures();
        assert!(tmp.path().join("index.md").is_file());
        assert!(tmp.path().join("notes/meta/field_trip.meta").is_file());
        assert!(tmp.path().join("notes/field_trip/map.pdf").is_file());
    }

    #[test]
    fn fixture_root_page() {
        let tmp = setup_fixtures();
        let page = open_page(tmp.path(), "");
        assert_eq!(page.title(), "index");
        assert!(page.content().contains("<h1>Home</h1>"));
        assert_link_texts(page.unreferenced_figures(), &["lighthouse.png"]);
        assert_link_texts(&page.children().unwrap(), &["about", "notes"]);
    }

    #[test]
    fn fixture_field_trip() {
        let tmp = setup_fixtures();
        let page = open_page(tmp.path(), "notes/field_trip");
        assert_eq!(page.title(), "Field notes");
        assert!(page.content().contains("<div class=\"figure-left\">"));
        assert!(page.content().contains("src=\"/static/notes/field_trip/cliffs.jpg\""));
        assert_link_texts(
            page.unreferenced_figures(),
            &["gannets.jpg", "thumbnail.png"],
        );
        assert_link_texts(&page.children().unwrap(), &["tide tables"]);
        assert_eq!(page.heading_index().len(), 2);
        assert_eq!(
            page.rights_markup().unwrap(),
            "<a href=\"http://creativecommons.org/licenses/by/4.0/\">Creative Commons Attribution</a>"
        );
    }

    #[test]
    fn fixture_siblings_follow_notebook_sort() {
        let tmp = setup_fixtures();
        let page = open_page(tmp.path(), "notes/field_trip");
        assert_addresses(page.siblings().unwrap(), &["notes/zoology", "notes/beach"]);
        let notebook = open_page(tmp.path(), "notes");
        assert_link_texts(
            &notebook.children().unwrap(),
            &["zoology", "field trip", "beach"],
        );
    }
}
