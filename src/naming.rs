//! Centralized filename and URL conventions.
//!
//! Every part of the engine names things the same way:
//!
//! - A page's **stem** is its filename without the extension. Stems are what
//!   addresses are made of: `notes/field_trip.md` is addressed as
//!   `notes/field_trip`.
//! - The **display title** of a stem replaces underscores with spaces:
//!   `field_trip` → "field trip".
//! - A **slug** goes the other way, turning a human-entered name into a stem:
//!   "Field Trip" → `Field_Trip`.
//! - Links are built by plain string joining with exactly one `/` between
//!   parts, so a URL prefix maps filesystem addresses onto site URLs without
//!   further validation.

/// Result of splitting a directory entry like `field_trip.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Filename without the extension (`field_trip`).
    pub stem: String,
    /// Extension including the leading dot (`.md`), empty if none.
    pub extension: String,
    /// Display title: stem with underscores converted to spaces.
    pub display_title: String,
}

/// Split a filename into stem and extension.
///
/// Leading dots never start an extension, so `.hidden` has stem `.hidden`
/// and no extension; only the last dot counts, so `archive.tar.gz` has stem
/// `archive.tar`.
pub fn parse_file_name(name: &str) -> ParsedName {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    let (stem, extension) = match name[leading_dots..].rfind('.') {
        Some(pos) => name.split_at(leading_dots + pos),
        None => (name, ""),
    };
    ParsedName {
        stem: stem.to_string(),
        extension: extension.to_string(),
        display_title: display_title(stem),
    }
}

/// File stem of a directory entry.
pub fn stem(name: &str) -> String {
    parse_file_name(name).stem
}

/// Lower-cased extension (with dot) of a directory entry.
pub fn extension_lower(name: &str) -> String {
    parse_file_name(name).extension.to_lowercase()
}

/// Human-readable form of a stem or address segment.
pub fn display_title(stem: &str) -> String {
    stem.replace('_', " ")
}

/// Turn a user-entered page name into a filename stem.
pub fn slugify(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Join two URL parts with exactly one `/` between them.
///
/// An empty part leaves the other unchanged, so optional prefixes and
/// addresses can be joined without special cases.
pub fn join_url(base: &str, part: &str) -> String {
    if base.is_empty() {
        return part.to_string();
    }
    if part.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        part.trim_start_matches('/')
    )
}

/// Join any number of URL parts, left to right.
pub fn join_url_all(parts: &[&str]) -> String {
    parts
        .iter()
        .fold(String::new(), |acc, part| join_url(&acc, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // parse_file_name() tests
    // =========================================================================

    #[test]
    fn splits_simple_extension() {
        let p = parse_file_name("field_trip.md");
        assert_eq!(p.stem, "field_trip");
        assert_eq!(p.extension, ".md");
        assert_eq!(p.display_title, "field trip");
    }

    #[test]
    fn only_last_dot_starts_extension() {
        let p = parse_file_name("archive.tar.gz");
        assert_eq!(p.stem, "archive.tar");
        assert_eq!(p.extension, ".gz");
    }

    #[test]
    fn no_extension() {
        let p = parse_file_name("README");
        assert_eq!(p.stem, "README");
        assert_eq!(p.extension, "");
    }

    #[test]
    fn leading_dot_is_not_an_extension() {
        let p = parse_file_name(".hidden");
        assert_eq!(p.stem, ".hidden");
        assert_eq!(p.extension, "");

        let p = parse_file_name(".config.toml");
        assert_eq!(p.stem, ".config");
        assert_eq!(p.extension, ".toml");
    }

    #[test]
    fn extension_is_lower_cased_on_request() {
        assert_eq!(extension_lower("PHOTO.JPG"), ".jpg");
        assert_eq!(stem("PHOTO.JPG"), "PHOTO");
    }

    // =========================================================================
    // display_title() / slugify() tests
    // =========================================================================

    #[test]
    fn display_title_replaces_underscores() {
        assert_eq!(display_title("a_long_walk"), "a long walk");
        assert_eq!(display_title("plain"), "plain");
    }

    #[test]
    fn slugify_replaces_spaces() {
        assert_eq!(slugify("A Long Walk"), "A_Long_Walk");
        assert_eq!(slugify("  padded  "), "padded");
    }

    // =========================================================================
    // join_url() tests
    // =========================================================================

    #[test]
    fn join_inserts_single_slash() {
        assert_eq!(join_url("/notes", "a"), "/notes/a");
        assert_eq!(join_url("/notes/", "a"), "/notes/a");
        assert_eq!(join_url("/notes/", "/a"), "/notes/a");
    }

    #[test]
    fn join_with_root_prefix() {
        assert_eq!(join_url("/", "a/b"), "/a/b");
    }

    #[test]
    fn join_with_empty_parts() {
        assert_eq!(join_url("", "a"), "a");
        assert_eq!(join_url("/static/", ""), "/static/");
    }

    #[test]
    fn join_all_folds_left() {
        assert_eq!(
            join_url_all(&["/static/", "notes", "trips/2019"]),
            "/static/notes/trips/2019"
        );
        assert_eq!(join_url_all(&["/static/", "", ""]), "/static/");
    }
}
