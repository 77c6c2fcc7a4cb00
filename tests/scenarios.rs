//! End-to-end resolution against throwaway archives.
//!
//! Each test builds a small docroot in a temp directory and drives the
//! public API the way a web front end would: open a page by address, read
//! what a view needs, sometimes save.

use flatnote::classify::Listing;
use flatnote::metadata::Record;
use flatnote::page::{Page, PageError, PageUpdate, Upload, Warning};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn open(root: &Path, address: &str) -> Page {
    Page::open(root, address, "/", "/static/").unwrap()
}

fn hrefs(links: &[flatnote::types::Link]) -> Vec<&str> {
    links.iter().map(|l| l.href.as_str()).collect()
}

// ============================================================================
// Figures on the root page
// ============================================================================

#[test]
fn tagged_figure_is_rendered_and_referenced() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.md", "# Title\nHello [[pic.jpg a cat]]");
    write(tmp.path(), "pic.jpg", "");

    let page = open(tmp.path(), "");
    assert!(page.content().contains("<h1>Title</h1>"));
    assert!(page.content().contains("<img src=\"/static/pic.jpg\""));
    assert!(page.content().contains("a cat"));
    assert!(page.unreferenced_figures().is_empty());
}

#[test]
fn untagged_figure_is_unreferenced() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.md", "# Title\nHello");
    write(tmp.path(), "pic.jpg", "");

    let page = open(tmp.path(), "");
    let figures = page.unreferenced_figures();
    assert_eq!(figures.len(), 1);
    assert_eq!(figures[0].href, "/static/pic.jpg");
    assert_eq!(figures[0].text, "pic.jpg");
}

// ============================================================================
// Missing pages
// ============================================================================

#[test]
fn missing_page_gets_placeholder() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "other.md", "x");

    let page = open(tmp.path(), "missing");
    assert!(page.file().is_none());
    assert!(page.content().contains("missing"));
    assert_eq!(page.title(), "missing");
    assert!(
        page.warnings()
            .contains(&Warning::PageNotFound("missing".to_string()))
    );
}

#[test]
fn missing_docroot_is_the_only_error() {
    let tmp = TempDir::new().unwrap();
    let result = Page::open(tmp.path().join("gone"), "", "/", "/static/");
    assert!(matches!(result, Err(PageError::DocrootNotFound(_))));
}

#[test]
fn root_without_index_still_resolves() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.md", "a");

    let page = open(tmp.path(), "");
    assert!(page.is_root());
    assert_eq!(page.content(), "<h1>Index /</h1>");
    assert!(page.warnings().contains(&Warning::IndexNotFound));
    assert_eq!(hrefs(&page.children().unwrap()), vec!["/a/"]);
}

// ============================================================================
// Metadata driven behaviour
// ============================================================================

#[test]
fn reverse_sort_flips_children() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "notes.md", "# Notes");
    write(tmp.path(), "notes.meta", "sort: reverse\n");
    for name in ["alpha.md", "beta.md", "gamma.txt"] {
        write(tmp.path(), &format!("notes/{name}"), "x");
    }

    let classified = Listing::read(&tmp.path().join("notes"), true).unwrap();
    assert_eq!(classified.page, vec!["alpha.md", "beta.md", "gamma.txt"]);

    let page = open(tmp.path(), "notes");
    assert_eq!(
        hrefs(&page.children().unwrap()),
        vec!["/notes/gamma/", "/notes/beta/", "/notes/alpha/"]
    );
}

#[test]
fn repeated_title_is_newline_joined() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "note.txt", "body");
    write(tmp.path(), "note.meta", "DC.Title: Hello\nDC.Title: World\n");

    let page = open(tmp.path(), "note");
    assert_eq!(page.title(), "Hello\nWorld");
}

#[test]
fn html_page_is_served_verbatim() {
    let tmp = TempDir::new().unwrap();
    let html = "<p>[[pic.jpg not a tag here]]</p>";
    write(tmp.path(), "raw.html", html);
    write(tmp.path(), "raw/pic.jpg", "");

    let page = open(tmp.path(), "raw");
    assert_eq!(page.content(), html);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn nested_page_navigation() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.md", "# Home");
    write(tmp.path(), "trips.md", "# Trips");
    write(tmp.path(), "trips/coast.md", "# Coast");
    write(tmp.path(), "trips/hills.md", "# Hills");
    write(tmp.path(), "trips/moor.md", "# Moor");

    let page = open(tmp.path(), "trips/hills/");
    assert_eq!(page.address(), "trips/hills");

    let crumbs: Vec<Option<String>> = page.breadcrumbs().into_iter().map(|c| c.href).collect();
    assert_eq!(
        crumbs,
        vec![
            Some("/".to_string()),
            Some("/trips".to_string()),
            Some("/trips/hills".to_string()),
            Some("/trips/coast".to_string()),
            Some("/trips/moor".to_string()),
        ]
    );

    assert_eq!(page.previous().unwrap().href, "/trips/coast");
    assert_eq!(page.next_page().unwrap().href, "/trips/moor");
    assert_eq!(page.parent().unwrap().address(), "trips");

    let siblings: Vec<&str> = page.siblings().unwrap().iter().map(Page::address).collect();
    assert_eq!(siblings, vec!["trips/coast", "trips/moor"]);
}

#[test]
fn top_level_page_links_back_to_index() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.md", "# Home");
    write(tmp.path(), "about.md", "# About");

    let page = open(tmp.path(), "about");
    let up = page.parent_link().unwrap();
    assert_eq!(up.href, "/");
    assert_eq!(up.text, "Index");
    assert!(open(tmp.path(), "").parent().is_none());
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn save_creates_page_paired_dir_uploads_and_metadata() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "about.md", "# About");

    let mut page = open(tmp.path(), "journal");
    assert!(page.file().is_none());

    let update = PageUpdate {
        content: Some("# Journal\n\n[[sketch.png A sketch]]".to_string()),
        new_filename: None,
        fields: vec![
            ("dc_title".to_string(), "My journal".to_string()),
            ("sort".to_string(), "reverse".to_string()),
        ],
    };
    let uploads = [Upload {
        filename: "uploads/sketch.png".to_string(),
        data: vec![0x89, b'P', b'N', b'G'],
    }];
    page.save(&update, &uploads).unwrap();

    assert_eq!(
        fs::read_to_string(tmp.path().join("journal.md")).unwrap(),
        "# Journal\n\n[[sketch.png A sketch]]"
    );
    assert!(tmp.path().join("journal/sketch.png").is_file());

    let metafile = page.metadata().unwrap().metafile().unwrap().to_path_buf();
    let record = Record::parse_str(&fs::read_to_string(metafile).unwrap());
    assert_eq!(record.title(), "My journal");
    assert!(record.sorts_reverse());

    let reopened = open(tmp.path(), "journal");
    assert_eq!(reopened.title(), "My journal");
    assert!(reopened.unreferenced_figures().is_empty());
    assert!(reopened.content().contains("/static/journal/sketch.png"));
}
