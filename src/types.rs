//! Shared value types handed to callers.
//!
//! These are what a view layer renders: every relation the resolver computes
//! comes back as one of these, so templates only ever need
//! `<a href="{{ href }}">{{ text }}</a>`.

use serde::{Deserialize, Serialize};

/// A resolved `(link, text)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

impl Link {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// One breadcrumb. The trailing `prev`/`next` crumbs have no link at the
/// ends of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub text: String,
}

/// An entry of a page's heading index: the anchor id assigned to an
/// `h2`/`h3`/`h4` element and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub anchor: String,
    pub text: String,
}
