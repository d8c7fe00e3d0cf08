//! Lenient quick-xml plumbing shared by the container and package parsers.
//!
//! EPUBs in the wild carry mismatched end tags, duplicate attributes and
//! undeclared prefixes. The reader is configured to accept all of that, and
//! attribute errors are skipped instead of aborting the scan.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::markup::decode_entities;

/// Build a reader that tolerates the usual EPUB packaging sloppiness.
pub(crate) fn lenient_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

/// Local part of a qualified element name (`dc:title` -> `title`).
pub(crate) fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}

/// Decode the qualified name of an element, lossily.
pub(crate) fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Collect `(key, value)` pairs, skipping malformed attributes.
///
/// Values have character references decoded.
pub(crate) fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .with_checks(false)
        .filter_map(|attr| attr.ok())
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = decode_entities(&raw).into_owned();
            (key, value)
        })
        .collect()
}

/// Value of the first attribute whose key matches `name` (ASCII case-insensitive).
pub(crate) fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
