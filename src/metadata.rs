//! Page metadata sidecar files.
//!
//! Every page may carry a `.meta` sidecar holding Dublin Core descriptive
//! elements and a handful of page commands:
//!
//! ```text
//! # Dublin Core metadata.
//! DC.Title: Field notes
//! DC.Creator: A. Walker
//! DC.Subject: geology
//! DC.Subject: coastlines
//! DC.Date: 2019-04-03
//! DC.Rights: cc-by
//! # End Dublin Core elements.
//!
//! # Page commands.
//! sort: reverse
//! status: draft
//! # End page commands.
//! ```
//!
//! ## Sidecar location
//!
//! For a page file `notes/field_trip.md` the sidecar is the first of these
//! that exists:
//!
//! 1. `notes/field_trip.meta` (beside the page)
//! 2. `notes/meta/field_trip.meta` (in a `meta/` directory beside the page)
//! 3. `notes/field_trip/field_trip.meta` (inside the paired directory)
//!
//! New sidecars are written to the second location.
//!
//! ## Parsing
//!
//! Lines starting with `#` are comments. Every other line is split at its
//! first colon into key and value. Keys are matched case-insensitively with
//! dots read as underscores, so `DC.Title`, `dc_title` and `title` all name
//! the title element. Descriptive elements are lists: repeated keys append,
//! preserving order. Page commands hold a single value. Keys that are neither
//! are kept verbatim and written back on save so hand-added fields survive
//! a round trip through an editor.

use crate::config::License;
use maud::html;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error on metafile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory, beside a page, that holds new sidecar files.
pub const META_DIR: &str = "meta";

/// Dublin Core descriptive elements, in canonical file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Title,
    Creator,
    Subject,
    Description,
    Contributor,
    Coverage,
    Date,
    Type,
    Format,
    Source,
    Language,
    Relation,
    Identifier,
    Publisher,
    Rights,
}

impl Element {
    pub const ALL: [Element; 15] = [
        Element::Title,
        Element::Creator,
        Element::Subject,
        Element::Description,
        Element::Contributor,
        Element::Coverage,
        Element::Date,
        Element::Type,
        Element::Format,
        Element::Source,
        Element::Language,
        Element::Relation,
        Element::Identifier,
        Element::Publisher,
        Element::Rights,
    ];

    /// Lower-case element name (`title`).
    pub fn name(self) -> &'static str {
        match self {
            Element::Title => "title",
            Element::Creator => "creator",
            Element::Subject => "subject",
            Element::Description => "description",
            Element::Contributor => "contributor",
            Element::Coverage => "coverage",
            Element::Date => "date",
            Element::Type => "type",
            Element::Format => "format",
            Element::Source => "source",
            Element::Language => "language",
            Element::Relation => "relation",
            Element::Identifier => "identifier",
            Element::Publisher => "publisher",
            Element::Rights => "rights",
        }
    }

    /// Key as written to a metafile (`DC.Title`).
    pub fn key(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        };
        format!("DC.{capitalized}")
    }

    /// Form field name (`dc_title`).
    pub fn field(self) -> String {
        format!("dc_{}", self.name())
    }

    /// Recognize `DC.Title`, `dc_title` or `title`, in any case.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().to_lowercase().replace('.', "_");
        let name = normalized.strip_prefix("dc_").unwrap_or(&normalized);
        Element::ALL.into_iter().find(|e| e.name() == name)
    }
}

/// Page commands: control directives passed through to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Status,
    Sort,
    ListStyle,
    Deny,
    Allow,
    Embargo,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Status,
        Command::Sort,
        Command::ListStyle,
        Command::Deny,
        Command::Allow,
        Command::Embargo,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Sort => "sort",
            Command::ListStyle => "liststyle",
            Command::Deny => "deny",
            Command::Allow => "allow",
            Command::Embargo => "embargo",
        }
    }

    /// Recognize a command key; `list-style` and `list_style` are accepted
    /// for `liststyle`.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        Command::ALL.into_iter().find(|c| c.key() == normalized)
    }
}

/// One parsed metadata record.
///
/// Every element and command is always present, so lookups never fail:
/// an absent element is an empty list, an absent command is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    elements: BTreeMap<Element, Vec<String>>,
    commands: BTreeMap<Command, Option<String>>,
    extra: Vec<(String, String)>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            elements: Element::ALL.into_iter().map(|e| (e, Vec::new())).collect(),
            commands: Command::ALL.into_iter().map(|c| (c, None)).collect(),
            extra: Vec::new(),
        }
    }
}

impl Record {
    /// Parse metafile text.
    pub fn parse_str(text: &str) -> Self {
        let mut record = Record::default();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            record.apply(key, value.trim(), true);
        }
        record
    }

    /// Build a record from form-style `(field, value)` pairs such as
    /// `("dc_title", "Field notes")`. Unrecognized fields are ignored, since
    /// forms carry page content and other inputs alongside metadata.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = Record::default();
        for (key, value) in fields {
            record.apply(key.as_ref(), value.as_ref().trim(), false);
        }
        record
    }

    fn apply(&mut self, key: &str, value: &str, keep_unknown: bool) {
        if let Some(element) = Element::from_key(key) {
            if !value.is_empty() {
                self.push(element, value);
            }
        } else if let Some(command) = Command::from_key(key) {
            self.set_command(command, Some(value));
        } else if keep_unknown {
            self.extra.push((key.to_string(), value.to_string()));
        }
    }

    pub fn values(&self, element: Element) -> &[String] {
        self.elements
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push(&mut self, element: Element, value: impl Into<String>) {
        self.elements.entry(element).or_default().push(value.into());
    }

    pub fn set_values(&mut self, element: Element, values: Vec<String>) {
        self.elements.insert(element, values);
    }

    pub fn command(&self, command: Command) -> Option<&str> {
        self.commands.get(&command).and_then(|v| v.as_deref())
    }

    /// Set a command; an empty value clears it.
    pub fn set_command(&mut self, command: Command, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty()).map(String::from);
        self.commands.insert(command, value);
    }

    /// Fields that are neither elements nor commands, in file order.
    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    /// Carry over the unrecognized fields of `other`, replacing our own.
    pub fn retain_extra_from(&mut self, other: &Record) {
        self.extra = other.extra.clone();
    }

    /// True when no element, command or extra field holds a value.
    pub fn is_empty(&self) -> bool {
        self.elements.values().all(Vec::is_empty)
            && self.commands.values().all(Option::is_none)
            && self.extra.is_empty()
    }

    /// Serialize with the current local time in the trailer.
    pub fn serialize(&self) -> String {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.serialize_at(&stamp)
    }

    /// Serialize in canonical layout with a fixed trailer timestamp.
    pub fn serialize_at(&self, timestamp: &str) -> String {
        let mut out = String::from("# Dublin Core metadata.\n");
        for element in Element::ALL {
            let values = self.values(element);
            if values.is_empty() {
                out.push_str(&format!("{}: \n", element.key()));
            }
            for value in values {
                out.push_str(&format!("{}: {}\n", element.key(), value));
            }
        }
        out.push_str("# End Dublin Core elements.\n\n");

        out.push_str("# Page commands.\n");
        for command in Command::ALL {
            out.push_str(&format!(
                "{}: {}\n",
                command.key(),
                self.command(command).unwrap_or_default()
            ));
        }
        out.push_str("# End page commands.\n");

        if !self.extra.is_empty() {
            out.push_str("\n# Other fields.\n");
            for (key, value) in &self.extra {
                out.push_str(&format!("{key}: {value}\n"));
            }
            out.push_str("# End other fields.\n");
        }

        out.push_str(&format!("# Record written by flatnote at {timestamp}\n"));
        out
    }

    // =========================================================================
    // Field accessors
    // =========================================================================

    fn joined(&self, element: Element, separator: &str) -> String {
        self.values(element).join(separator)
    }

    pub fn title(&self) -> String {
        self.joined(Element::Title, "\n")
    }

    pub fn author(&self) -> String {
        self.joined(Element::Creator, "; ")
    }

    pub fn contributor(&self) -> String {
        self.joined(Element::Contributor, "; ")
    }

    pub fn publisher(&self) -> String {
        self.joined(Element::Publisher, "; ")
    }

    pub fn rights(&self) -> String {
        self.joined(Element::Rights, "; ")
    }

    pub fn source(&self) -> String {
        self.joined(Element::Source, "; ")
    }

    pub fn doctype(&self) -> String {
        self.joined(Element::Type, "; ")
    }

    pub fn format(&self) -> String {
        self.joined(Element::Format, "; ")
    }

    pub fn subject(&self) -> String {
        self.joined(Element::Subject, ", ")
    }

    pub fn location(&self) -> String {
        self.joined(Element::Coverage, ", ")
    }

    pub fn language(&self) -> String {
        self.joined(Element::Language, ", ")
    }

    pub fn description(&self) -> String {
        self.joined(Element::Description, "\n")
    }

    /// First date value, or empty.
    pub fn date(&self) -> String {
        self.values(Element::Date)
            .first()
            .cloned()
            .unwrap_or_default()
    }

    /// The sort command, or empty.
    pub fn sort(&self) -> String {
        self.command(Command::Sort).unwrap_or_default().to_string()
    }

    pub fn sorts_reverse(&self) -> bool {
        self.command(Command::Sort) == Some("reverse")
    }

    pub fn status(&self) -> Option<&str> {
        self.command(Command::Status)
    }

    pub fn list_style(&self) -> Option<&str> {
        self.command(Command::ListStyle)
    }

    pub fn embargo(&self) -> Option<&str> {
        self.command(Command::Embargo)
    }

    /// Groups or users the page is opened to. Not enforced here.
    pub fn allow(&self) -> Vec<String> {
        split_list(self.command(Command::Allow))
    }

    /// Groups or users the page is closed to. Not enforced here.
    pub fn deny(&self) -> Vec<String> {
        split_list(self.command(Command::Deny))
    }

    /// `(DC.Name, joined values)` pairs in canonical order.
    pub fn dublin_core(&self) -> Vec<(String, String)> {
        Element::ALL
            .into_iter()
            .map(|e| (e.key(), self.joined(e, "; ")))
            .collect()
    }

    /// Field name → value map for populating an edit form.
    pub fn form_fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = Element::ALL
            .into_iter()
            .map(|e| (e.field(), self.joined(e, "; ")))
            .collect();
        for command in Command::ALL {
            fields.insert(
                command.key().to_string(),
                self.command(command).unwrap_or_default().to_string(),
            );
        }
        fields
    }

    /// Anchor markup for a known licence code in the rights element.
    pub fn rights_markup(&self, licenses: &BTreeMap<String, License>) -> Option<String> {
        let license = licenses.get(&self.rights())?;
        Some(
            html! {
                a href=(license.url) { (license.name) }
            }
            .into_string(),
        )
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// =============================================================================
// Sidecar files
// =============================================================================

/// Find the sidecar for a page file. Returns `None` when there is none.
pub fn locate(page_file: &Path) -> Option<PathBuf> {
    let stem = page_file.file_stem()?.to_string_lossy().to_string();
    let dir = page_file.parent().unwrap_or_else(|| Path::new(""));
    let meta_name = format!("{stem}.meta");

    [
        dir.join(&meta_name),
        dir.join(META_DIR).join(&meta_name),
        dir.join(&stem).join(&meta_name),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Read and parse a metafile. A missing file yields an empty record.
pub fn parse(path: &Path) -> Result<Record, MetadataError> {
    if !path.exists() {
        return Ok(Record::default());
    }
    let text = fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Record::parse_str(&text))
}

/// Write a record to `target`, creating its directory and overwriting any
/// existing file.
pub fn save(record: &Record, target: &Path) -> Result<(), MetadataError> {
    let io_err = |source| MetadataError::Io {
        path: target.to_path_buf(),
        source,
    };
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            log::info!("creating metadata directory {}", dir.display());
            fs::create_dir_all(dir).map_err(io_err)?;
        }
    }
    fs::write(target, record.serialize()).map_err(io_err)
}

/// A record bound to the page file it describes.
#[derive(Debug, Clone)]
pub struct PageMetadata {
    page_file: PathBuf,
    metafile: Option<PathBuf>,
    record: Record,
}

impl PageMetadata {
    /// Locate and parse the sidecar of `page_file`.
    pub fn load(page_file: &Path) -> Result<Self, MetadataError> {
        let metafile = locate(page_file);
        let record = match &metafile {
            Some(path) => parse(path)?,
            None => Record::default(),
        };
        Ok(Self {
            page_file: page_file.to_path_buf(),
            metafile,
            record,
        })
    }

    /// An empty record for `page_file`, keeping whatever sidecar path was
    /// located so a later save overwrites it.
    pub fn empty(page_file: &Path) -> Self {
        Self {
            page_file: page_file.to_path_buf(),
            metafile: locate(page_file),
            record: Record::default(),
        }
    }

    pub fn page_file(&self) -> &Path {
        &self.page_file
    }

    pub fn metafile(&self) -> Option<&Path> {
        self.metafile.as_deref()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn set_record(&mut self, record: Record) {
        self.record = record;
    }

    /// Where a new sidecar goes: `<dir>/meta/<stem>.meta`, or the slug of
    /// `new_name` when the page is being renamed.
    pub fn preferred_path(&self, new_name: Option<&str>) -> PathBuf {
        let dir = self.page_file.parent().unwrap_or_else(|| Path::new(""));
        let stem = match new_name {
            Some(name) => crate::naming::slugify(name),
            None => self
                .page_file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        };
        dir.join(META_DIR).join(format!("{stem}.meta"))
    }

    /// Save the record. A rename always writes to the preferred path for the
    /// new name; otherwise the located sidecar is overwritten, or a new one
    /// is created at the preferred path.
    pub fn save(&mut self, new_name: Option<&str>) -> Result<PathBuf, MetadataError> {
        let target = match (new_name, &self.metafile) {
            (Some(_), _) => self.preferred_path(new_name),
            (None, Some(existing)) => existing.clone(),
            (None, None) => self.preferred_path(None),
        };
        save(&self.record, &target)?;
        self.metafile = Some(target.clone());
        Ok(target)
    }
}
