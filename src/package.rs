//! Package document (OPF) parser.
//!
//! Streams the package document once with quick-xml and gathers the few
//! structures the reader needs: Dublin Core title/author (plus a handful of
//! supplementary fields), the manifest id->href table, the spine order and
//! the cover reference.
//!
//! Parsing never fails. Missing blocks produce empty tables, and a document
//! that turns malformed halfway keeps whatever was read before the damage.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quick_xml::events::{BytesStart, Event};

use crate::markup::{collapse_whitespace, decode_entities};
use crate::xml::{attribute, attributes, element_name, lenient_reader, local_name};

/// Title used when the package document names none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Author used when the package document names none
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// One resource declared in `<manifest>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestItem {
    /// Path relative to the package document's directory
    pub href: String,
    /// Declared MIME type
    pub media_type: Option<String>,
    /// EPUB 3 properties (e.g. "cover-image", "nav")
    pub properties: Option<String>,
}

/// Structural content of a package document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDocument {
    /// Archive path of the package document itself
    pub path: String,
    /// Book title (`dc:title`)
    pub title: String,
    /// Book author (`dc:creator`)
    pub author: String,
    /// Language code (`dc:language`)
    pub language: Option<String>,
    /// Unique identifier (`dc:identifier`)
    pub identifier: Option<String>,
    /// Publisher (`dc:publisher`)
    pub publisher: Option<String>,
    /// Blurb (`dc:description`)
    pub description: Option<String>,
    /// Manifest table keyed by item id
    pub manifest: BTreeMap<String, ManifestItem>,
    /// Spine `idref` values in reading order
    pub spine: Vec<String>,
    /// Raw cover reference: a manifest id or an href
    pub cover_ref: Option<String>,
}

impl PackageDocument {
    /// Empty document for `path`, with default title and author.
    pub fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            language: None,
            identifier: None,
            publisher: None,
            description: None,
            manifest: BTreeMap::new(),
            spine: Vec::new(),
            cover_ref: None,
        }
    }

    /// Directory of the package document (no trailing slash; empty at archive root).
    pub fn base_dir(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Manifest href for an item id
    pub fn href(&self, id: &str) -> Option<&str> {
        self.manifest.get(id).map(|item| item.href.as_str())
    }

    /// Resolve a package-relative href to an archive path.
    pub fn resolve(&self, href: &str) -> String {
        resolve_relative_path(&self.path, href)
    }

    /// Spine entries that have a manifest item, as `(idref, href)` in reading order.
    pub fn resolvable_spine(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.spine
            .iter()
            .filter_map(|idref| self.href(idref).map(|href| (idref.as_str(), href)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Field {
    Title,
    Creator,
    Language,
    Identifier,
    Publisher,
    Description,
}

impl Field {
    fn from_local_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "title" => Some(Field::Title),
            "creator" => Some(Field::Creator),
            "language" => Some(Field::Language),
            "identifier" => Some(Field::Identifier),
            "publisher" => Some(Field::Publisher),
            "description" => Some(Field::Description),
            _ => None,
        }
    }
}

/// Scan state for one pass over the package document
#[derive(Default)]
struct Scan {
    fields: BTreeMap<Field, String>,
    manifest: BTreeMap<String, ManifestItem>,
    spine: Vec<String>,
    meta_cover: Option<String>,
    cover_prefixed_href: Option<String>,
    in_metadata: bool,
    in_manifest: bool,
    in_spine: bool,
    capture: Option<(Field, String, String)>,
}

impl Scan {
    fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    fn open(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        let qualified = element_name(e);
        let local = local_name(&qualified);

        if !is_empty {
            match local.to_ascii_lowercase().as_str() {
                "metadata" => self.in_metadata = true,
                "manifest" => self.in_manifest = true,
                "spine" => self.in_spine = true,
                _ => {}
            }
        }

        if self.in_manifest {
            self.manifest_item(e);
        } else if self.in_spine {
            if let Some(idref) = attribute(&attributes(e), "idref") {
                self.spine.push(idref.to_string());
            }
        } else if local.eq_ignore_ascii_case("meta") {
            let attrs = attributes(e);
            let is_cover = attribute(&attrs, "name").is_some_and(|n| n.eq_ignore_ascii_case("cover"));
            if is_cover && self.meta_cover.is_none() {
                if let Some(content) = attribute(&attrs, "content").filter(|c| !c.is_empty()) {
                    self.meta_cover = Some(content.to_string());
                }
            }
        } else if !is_empty && self.capture.is_none() {
            let is_dublin_core = qualified
                .split_once(':')
                .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case("dc"));
            if is_dublin_core || self.in_metadata {
                if let Some(field) = Field::from_local_name(local).filter(|f| !self.has(*f)) {
                    self.capture = Some((field, local.to_string(), String::new()));
                }
            }
        }
    }

    fn manifest_item(&mut self, e: &BytesStart<'_>) {
        let attrs = attributes(e);
        let (Some(id), Some(href)) = (attribute(&attrs, "id"), attribute(&attrs, "href")) else {
            return;
        };
        let item = ManifestItem {
            href: href.to_string(),
            media_type: attribute(&attrs, "media-type").map(str::to_string),
            properties: attribute(&attrs, "properties").map(str::to_string),
        };

        if self.cover_prefixed_href.is_none() && id.to_ascii_lowercase().starts_with("cover") {
            self.cover_prefixed_href = Some(item.href.clone());
        }
        self.manifest.insert(id.to_string(), item);
    }

    fn close(&mut self, qualified: &str) {
        let local = local_name(qualified);
        let ends_capture = self
            .capture
            .as_ref()
            .is_some_and(|(_, name, _)| name.eq_ignore_ascii_case(local));
        if ends_capture {
            if let Some((field, _, text)) = self.capture.take() {
                let text = collapse_whitespace(&text);
                if !text.is_empty() {
                    self.fields.insert(field, text);
                }
            }
        }

        match local.to_ascii_lowercase().as_str() {
            "metadata" => self.in_metadata = false,
            "manifest" => self.in_manifest = false,
            "spine" => self.in_spine = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, _, buf)) = self.capture.as_mut() {
            buf.push_str(text);
        }
    }

    fn take(&mut self, field: Field) -> Option<String> {
        self.fields.remove(&field)
    }

    fn finish(mut self, path: &str) -> PackageDocument {
        let mut doc = PackageDocument::empty(path);
        if let Some(title) = self.take(Field::Title) {
            doc.title = title;
        }
        if let Some(author) = self.take(Field::Creator) {
            doc.author = author;
        }
        doc.language = self.take(Field::Language);
        doc.identifier = self.take(Field::Identifier);
        doc.publisher = self.take(Field::Publisher);
        doc.description = self.take(Field::Description);
        doc.cover_ref = self.meta_cover.or(self.cover_prefixed_href);
        doc.manifest = self.manifest;
        doc.spine = self.spine;
        doc
    }
}

/// Parse a package document located at `path` inside the archive.
pub fn parse_package_document(content: &[u8], path: &str) -> PackageDocument {
    let mut reader = lenient_reader(content);
    let mut buf = Vec::new();
    let mut scan = Scan::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => scan.open(&e, false),
            Ok(Event::Empty(e)) => scan.open(&e, true),
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                scan.close(&name);
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().unwrap_or_default();
                scan.text(&decode_entities(&text));
            }
            Ok(Event::CData(e)) => {
                let text = reader.decoder().decode(&e).unwrap_or_default();
                scan.text(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = format!("&{};", e.decode().unwrap_or_default());
                scan.text(&decode_entities(&entity));
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                log::debug!("Package document '{}' scan stopped early: {:?}", path, err);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    scan.finish(path)
}

/// Join a package-relative `href` onto the package document's directory.
///
/// Fragments are dropped, `.`/`..` segments are resolved and a leading `/`
/// is taken as archive-absolute.
pub fn resolve_relative_path(package_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    if href.is_empty() {
        return normalize_path(package_path);
    }
    if href.starts_with('/') {
        return normalize_path(href);
    }

    let base_dir = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    if base_dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{}/{}", base_dir, href))
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
