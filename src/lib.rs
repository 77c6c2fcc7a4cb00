//! # flatnote
//!
//! Page resolution and linking for flat-file archives. Your filesystem is the
//! database: text, markdown and HTML files are pages, a directory named like
//! a page holds its children, figures and documents, and `.meta` sidecars
//! carry Dublin Core metadata.
//!
//! ```text
//! archive/
//! ├── config.toml              # optional archive settings
//! ├── index.md                 # the root page
//! ├── harbour.jpg              # a figure of the root page
//! ├── notes.md                 # a page ...
//! ├── notes.meta               # ... its metadata ...
//! └── notes/                   # ... and its paired directory
//!     ├── field_trip.md        # child page
//!     ├── meta/field_trip.meta
//!     └── field_trip/
//!         ├── cliffs.jpg       # figure, tagged as [[cliffs.jpg caption]]
//!         └── map.pdf          # document
//! ```
//!
//! # Architecture
//!
//! A caller builds a [`page::Page`] from a docroot and an address such as
//! `notes/field_trip`. Construction classifies the parent and paired
//! directories, picks the page file, reads it and attaches its metadata.
//! Everything else (rendered content, breadcrumbs, children, siblings,
//! neighbours) is computed on demand and kept for the life of the page.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | The resolver: one page, its file, relations and writes |
//! | [`classify`] | Sorts one directory's entries into suffix buckets |
//! | [`figures`] | Replaces `[[file caption]]` tags with figure markup |
//! | [`metadata`] | Locates, parses, serializes and saves `.meta` sidecars |
//! | [`render`] | Markdown to HTML with heading anchors and a fallback `h1` |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`archive`] | Walks a docroot for every page address and checks them |
//! | [`naming`] | Stem, display title, slug and URL-joining conventions |
//! | [`types`] | Serializable link types handed to views |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Recoverable Resolution
//!
//! Only a missing docroot is an error. A page with no file, no paired
//! directory or an unreadable sidecar still resolves: the problem is kept as
//! a [`page::Warning`] on that page and its content becomes a placeholder
//! heading, so breadcrumbs and sibling navigation work for a missing page.
//!
//! ## Typed Listings
//!
//! A directory classification is a [`classify::Listing`] with one named
//! field per bucket. Nothing looks buckets up by string.
//!
//! ## Maud for Generated Markup
//!
//! Every fragment the engine produces (figures, placeholders, synthesized
//! headings, licence links) is built with [Maud](https://maud.lambda.xyz/),
//! so captions and titles are escaped without thinking about it.
//!
//! ## One Request, One Thread
//!
//! Pages share directory listings through `Rc` and memoize with
//! `std::cell::OnceCell`. There is no cache between pages: each request
//! builds its own, and concurrent saves to the same page are last write wins.

pub mod archive;
pub mod classify;
pub mod config;
pub mod figures;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod page;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
