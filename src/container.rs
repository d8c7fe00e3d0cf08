//! Container resolver: finds the package document named by
//! `META-INF/container.xml`.
//!
//! Resolution never fails. An archive without a usable container descriptor
//! is assumed to follow the common `OEBPS/content.opf` layout.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quick_xml::events::Event;

use crate::xml::{attribute, attributes, element_name, lenient_reader, local_name};

/// Fixed location of the container descriptor
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Package document path assumed when the container cannot tell us
pub const DEFAULT_PACKAGE_PATH: &str = "OEBPS/content.opf";

/// Extract the `full-path` of the first `rootfile` declaration.
///
/// Returns `None` when no rootfile carries a non-empty `full-path`. A parse
/// error ends the scan without discarding a path already found.
pub fn parse_container_xml(content: &[u8]) -> Option<String> {
    let mut reader = lenient_reader(content);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(&element_name(&e)).eq_ignore_ascii_case("rootfile") {
                    let attrs = attributes(&e);
                    if let Some(path) = attribute(&attrs, "full-path")
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                    {
                        return Some(path.to_string());
                    }
                }
            }
            Ok(Event::Eof) => return None,
            Err(err) => {
                log::debug!("container.xml scan stopped: {:?}", err);
                return None;
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Package document path for an opened archive, falling back to
/// [`DEFAULT_PACKAGE_PATH`].
#[cfg(feature = "std")]
pub fn resolve_package_path<R: std::io::Read + std::io::Seek>(
    archive: &mut crate::zip::EpubArchive<R>,
) -> String {
    let resolved = archive
        .entry(CONTAINER_PATH)
        .and_then(|bytes| parse_container_xml(&bytes));
    match resolved {
        Some(path) => path,
        None => {
            log::debug!(
                "No usable rootfile in {}; assuming {}",
                CONTAINER_PATH,
                DEFAULT_PACKAGE_PATH
            );
            DEFAULT_PACKAGE_PATH.to_string()
        }
    }
}
