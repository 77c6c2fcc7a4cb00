//! Inline figure references.
//!
//! Page text refers to images in its paired directory with a bracket tag:
//!
//! ```text
//! [[sunset.jpg Anything after the first space is the caption.]]
//! [[L:sunset.jpg Floated left]]
//! [[R:sunset.jpg Floated right]]
//! ```
//!
//! Each tag becomes a figure fragment:
//!
//! ```html
//! <div class="figure"><img src="PREFIX/sunset.jpg" alt="sunset.jpg"><p class="caption">…</p></div>
//! ```
//!
//! with `figure-left` / `figure-right` as the class for the `L:` / `R:`
//! forms. Resolution also reports which figures of the directory no tag
//! mentioned, so a page can list them as a gallery beneath its text.
//!
//! ## Tag matching
//!
//! Tags are matched with the greedy per-line pattern `\[\[.*\]\]`. Two tags
//! on the same line are therefore consumed as a single match: the first
//! filename wins and everything after it, brackets removed, becomes the
//! caption. Pages put one figure per line.

use crate::classify::Listing;
use crate::naming;
use crate::types::Link;
use maud::html;
use std::path::Path;
use std::sync::LazyLock;

static FIGURE_TAG: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\[\[.*\]\]").expect("figure tag pattern must compile")
});

/// Output of figure resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolved {
    /// Source text with every tag replaced by its fragment.
    pub text: String,
    /// Figures no tag referred to, as `(prefix/filename, filename)`, in the
    /// order they were supplied.
    pub unreferenced: Vec<Link>,
}

/// Float style selected by a tag's optional `L:` / `R:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    None,
    Left,
    Right,
}

impl Float {
    pub fn class(self) -> &'static str {
        match self {
            Float::None => "figure",
            Float::Left => "figure-left",
            Float::Right => "figure-right",
        }
    }
}

/// One parsed bracket tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureTag {
    pub filename: String,
    pub caption: String,
    pub float: Float,
}

impl FigureTag {
    /// Parse the text of a matched tag, brackets included.
    pub fn parse(matched: &str) -> Self {
        let inner = matched.replace("[[", "").replace("]]", "");
        let inner = inner.trim();
        let (name, caption) = match inner.split_once(char::is_whitespace) {
            Some((name, caption)) => (name, caption.trim()),
            None => (inner, ""),
        };

        let (float, filename) = if let Some(rest) = name.strip_prefix("L:") {
            (Float::Left, rest)
        } else if let Some(rest) = name.strip_prefix("R:") {
            (Float::Right, rest)
        } else {
            (Float::None, name)
        };

        Self {
            filename: filename.to_string(),
            caption: caption.to_string(),
            float,
        }
    }

    /// Render the figure fragment. The caption is HTML-escaped.
    pub fn to_html(&self, url_prefix: &str) -> String {
        let src = naming::join_url(url_prefix, &self.filename);
        let markup = html! {
            div class=(self.float.class()) {
                img src=(src) alt=(self.filename);
                p class="caption" { (self.caption) }
            }
        };
        format!("{}\n\n", markup.into_string())
    }
}

/// Replace figure tags in `source` and report unreferenced figures.
///
/// `figures` are the filenames of the paired directory's figure bucket;
/// links are built by joining them onto `url_prefix`.
pub fn resolve(source: &str, url_prefix: &str, figures: &[String]) -> Resolved {
    let mut unreferenced: Vec<Link> = figures
        .iter()
        .map(|f| Link::new(naming::join_url(url_prefix, f), f.clone()))
        .collect();

    let mut text = source.to_string();
    for found in FIGURE_TAG.find_iter(source) {
        let matched = found.as_str();
        let tag = FigureTag::parse(matched);
        text = text.replace(matched, &tag.to_html(url_prefix));

        if let Some(pos) = unreferenced.iter().position(|l| l.text == tag.filename) {
            unreferenced.remove(pos);
        }
    }

    Resolved { text, unreferenced }
}

/// Resolve against the figure bucket of a directory.
///
/// Without a directory, or when it cannot be classified, the source comes
/// back unchanged with no unreferenced figures.
pub fn resolve_in(source: &str, url_prefix: &str, dir: Option<&Path>) -> Resolved {
    let listing = dir.and_then(|d| match Listing::read(d, true) {
        Ok(listing) => Some(listing),
        Err(e) => {
            log::debug!("figure directory unavailable: {e}");
            None
        }
    });

    match listing {
        Some(listing) => resolve(source, url_prefix, &listing.figures),
        None => Resolved {
            text: source.to_string(),
            unreferenced: Vec::new(),
        },
    }
}
