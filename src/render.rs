//! Markdown rendering for text and markdown pages.
//!
//! Runs pulldown-cmark over the page text. While rendering, every
//! `h2`/`h3`/`h4` gets an anchor id counted per level (`h2-1`, `h2-2`,
//! `h3-1`, …) and is recorded in the heading index. A page without an `h1`
//! gets one synthesized from its filename, marked `noprint`.
//!
//! The serialized HTML then goes through [`smarten`], which curls quotes
//! and joins dashes and ellipses in every text node, raw HTML blocks and
//! figure captions included. The heading index keeps the text as written.

use crate::types::Heading;
use maud::html;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html as md_html};

/// Rendered HTML with the heading index collected on the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rendered {
    pub html: String,
    pub headings: Vec<Heading>,
}

fn indexed_level(level: HeadingLevel) -> Option<usize> {
    match level {
        HeadingLevel::H2 => Some(2),
        HeadingLevel::H3 => Some(3),
        HeadingLevel::H4 => Some(4),
        _ => None,
    }
}

/// Render `source` as HTML. `fallback_title` becomes the `h1` when the
/// document has none.
pub fn markdown_to_html(source: &str, fallback_title: &str) -> Rendered {
    let options = Options::ENABLE_TABLES;
    let parser = Parser::new_ext(source, options);

    let mut counters = [0usize; 3];
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;
    let mut has_h1 = false;
    let mut events = Vec::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = match indexed_level(level) {
                    Some(n) => {
                        counters[n - 2] += 1;
                        let anchor = format!("h{}-{}", n, counters[n - 2]);
                        current = Some(Heading {
                            anchor: anchor.clone(),
                            text: String::new(),
                        });
                        Some(CowStr::from(anchor))
                    }
                    None => {
                        has_h1 |= level == HeadingLevel::H1;
                        id
                    }
                };
                events.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
                events.push(Event::End(TagEnd::Heading(level)));
            }
            Event::Text(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
                events.push(Event::Text(text));
            }
            Event::Code(code) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&code);
                }
                events.push(Event::Code(code));
            }
            Event::Html(raw) => {
                has_h1 |= raw.contains("<h1");
                events.push(Event::Html(raw));
            }
            Event::InlineHtml(raw) => {
                has_h1 |= raw.contains("<h1");
                events.push(Event::InlineHtml(raw));
            }
            other => events.push(other),
        }
    }

    let mut body = String::new();
    md_html::push_html(&mut body, events.into_iter());

    let html = if has_h1 {
        body
    } else {
        let heading = html! { h1 class="noprint" { (fallback_title) } };
        format!("{}\n\n{}", heading.into_string(), body)
    };

    Rendered {
        html: smarten(&html),
        headings,
    }
}

// ============================================================================
// Typographic punctuation
// ============================================================================

/// Elements whose text is left exactly as written.
const VERBATIM_ELEMENTS: &[&str] = &["pre", "code", "kbd", "samp", "script", "style", "textarea"];

/// Characters after which a quote opens rather than closes.
const OPENERS: &str = "([{-\u{2013}\u{2014}\u{201c}\u{2018}";

/// Curl straight quotes and join `---`, `--` and `...` in the text of an
/// HTML fragment.
///
/// Tags (with their attribute values), comments and the contents of
/// [`VERBATIM_ELEMENTS`] pass through untouched. Escaped `&quot;` and
/// `&#39;` in text count as quotes.
pub fn smarten(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    // Last text character seen, carried across tags.
    let mut prev: Option<char> = None;
    let mut rest = html;

    while !rest.is_empty() {
        let end = if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            end
        } else if is_tag_start(rest) {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            let tag = &rest[..end];
            track_verbatim(tag, &mut verbatim_depth);
            out.push_str(tag);
            end
        } else {
            // A stray `<` that opens no tag is text.
            let end = rest[1..].find('<').map_or(rest.len(), |i| i + 1);
            let text = &rest[..end];
            if verbatim_depth > 0 {
                out.push_str(text);
                prev = text.chars().last().or(prev);
            } else {
                out.push_str(&smarten_text(text, &mut prev));
            }
            end
        };
        rest = &rest[end..];
    }
    out
}

fn is_tag_start(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn track_verbatim(tag: &str, depth: &mut usize) {
    let inner = &tag[1..];
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    if !VERBATIM_ELEMENTS.contains(&name.as_str()) || tag.ends_with("/>") {
        return;
    }
    if closing {
        *depth = depth.saturating_sub(1);
    } else {
        *depth += 1;
    }
}

fn smarten_text(text: &str, prev: &mut Option<char>) -> String {
    let text = text
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("...", "\u{2026}")
        .replace("---", "\u{2014}")
        .replace("--", "\u{2013}");
    let chars: Vec<char> = text.chars().collect();

    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let (open, close) = match c {
            '"' => ('\u{201c}', '\u{201d}'),
            '\'' => ('\u{2018}', '\u{2019}'),
            _ => {
                out.push(c);
                *prev = Some(c);
                continue;
            }
        };
        // With nothing before it, a quote opens unless space or
        // punctuation follows.
        let opens = match *prev {
            Some(p) => p.is_whitespace() || OPENERS.contains(p),
            None => chars
                .get(i + 1)
                .is_none_or(|n| !(n.is_whitespace() || n.is_ascii_punctuation())),
        };
        let curled = if opens { open } else { close };
        out.push(curled);
        *prev = Some(curled);
    }
    out
}
