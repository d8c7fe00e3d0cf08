//! Plain-text helpers for chapter markup.
//!
//! Chapter documents are treated as loosely formed markup, not XML: a stray
//! `&` or an HTML-only entity must not lose the chapter. Tags are blanked out
//! by a byte scan and entities are decoded best-effort.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::string::String;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};

/// Named entities outside the XML predefined set that show up in XHTML chapters.
fn resolve_html_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or(match name {
        "nbsp" => Some("\u{a0}"),
        "shy" => Some(""),
        "ensp" => Some("\u{2002}"),
        "emsp" => Some("\u{2003}"),
        "thinsp" => Some("\u{2009}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "hellip" => Some("\u{2026}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "trade" => Some("\u{2122}"),
        "laquo" => Some("\u{ab}"),
        "raquo" => Some("\u{bb}"),
        _ => None,
    })
}

/// Decode character and entity references; on any malformed reference the
/// text is returned unchanged.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    unescape_with(text, resolve_html_entity).unwrap_or(Cow::Borrowed(text))
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    if result.ends_with(' ') {
        result.pop();
    }
    result
}

/// Replace every `<...>` tag with a single space.
///
/// A `<` with no closing `>` later in the text, or an empty `<>`, is kept as text.
pub fn blank_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => {
                out.push(' ');
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Reduce chapter markup to display text: tags blanked, entities decoded,
/// whitespace collapsed and trimmed.
pub fn strip_markup(markup: &str) -> String {
    let blanked = blank_tags(markup);
    collapse_whitespace(&decode_entities(&blanked))
}

/// Title of a chapter document: the `<title>` element, else the first `<h1>`.
///
/// Only plain-text content counts; an element wrapping other tags does not
/// match. Matching is ASCII case-insensitive.
pub fn sniff_title(markup: &str) -> Option<String> {
    find_element_text(markup, "title", false).or_else(|| find_element_text(markup, "h1", true))
}

fn find_element_text(markup: &str, tag: &str, allow_attributes: bool) -> Option<String> {
    let lower = markup.to_ascii_lowercase();
    let open = alloc::format!("<{}", tag);
    let close = alloc::format!("</{}>", tag);
    let mut from = 0usize;

    while let Some(pos) = lower[from..].find(&open) {
        let start = from + pos;
        let after_name = start + open.len();
        from = after_name;

        let Some(gt) = lower[after_name..].find('>') else {
            return None;
        };
        let head = &lower[after_name..after_name + gt];
        let attributes_ok = if allow_attributes {
            head.is_empty() || head.starts_with(|c: char| c.is_ascii_whitespace())
        } else {
            head.is_empty()
        };
        if !attributes_ok || head.ends_with('/') {
            continue;
        }

        let content_start = after_name + gt + 1;
        let content_len = lower[content_start..].find('<')?;
        if content_len == 0 || !lower[content_start + content_len..].starts_with(&close) {
            continue;
        }

        let text = collapse_whitespace(&decode_entities(
            &markup[content_start..content_start + content_len],
        ));
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup_simple() {
        assert_eq!(strip_markup("<p>Hello <b>World</b></p>"), "Hello World");
    }

    #[test]
    fn test_strip_markup_collapses_whitespace() {
        let html = "<html>\n  <body>\n    <p>One</p>\n\n    <p>Two\tthree</p>\n  </body>\n</html>";
        assert_eq!(strip_markup(html), "One Two three");
    }

    #[test]
    fn test_strip_markup_keeps_head_text() {
        let html = "<html><head><title>Chapter 1</title></head><body><p>Hello</p></body></html>";
        assert_eq!(strip_markup(html), "Chapter 1 Hello");
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(
            strip_markup("<p>Barnes &amp; Noble&nbsp;&#8220;Hi&#8221;</p>"),
            "Barnes & Noble \u{201c}Hi\u{201d}"
        );
    }

    #[test]
    fn test_strip_markup_bad_entity_keeps_text() {
        assert_eq!(strip_markup("<p>Q&A &unknown;</p>"), "Q&A &unknown;");
    }

    #[test]
    fn test_blank_tags_unclosed_angle_is_text() {
        assert_eq!(blank_tags("a < b"), "a < b");
        assert_eq!(blank_tags("a <> b"), "a <> b");
        assert_eq!(blank_tags("x<br/>y"), "x y");
    }

    #[test]
    fn test_strip_markup_empty() {
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("<div>   </div>"), "");
    }

    #[test]
    fn test_sniff_title_prefers_title_element() {
        let html = "<html><head><title>X</title></head><body><h1>Y</h1></body></html>";
        assert_eq!(sniff_title(html).as_deref(), Some("X"));
    }

    #[test]
    fn test_sniff_title_falls_back_to_h1() {
        let html = r#"<html><body><h1 class="chapter">  The Storm  </h1></body></html>"#;
        assert_eq!(sniff_title(html).as_deref(), Some("The Storm"));
    }

    #[test]
    fn test_sniff_title_case_insensitive() {
        assert_eq!(sniff_title("<TITLE>Loud</TITLE>").as_deref(), Some("Loud"));
    }

    #[test]
    fn test_sniff_title_skips_nested_markup() {
        let html = "<h1><span>Nested</span></h1><h1>Plain</h1>";
        assert_eq!(sniff_title(html).as_deref(), Some("Plain"));
    }

    #[test]
    fn test_sniff_title_ignores_empty_title() {
        let html = "<title>   </title><h1>Real</h1>";
        assert_eq!(sniff_title(html).as_deref(), Some("Real"));
    }

    #[test]
    fn test_sniff_title_ignores_similar_tags() {
        let html = "<h10>no</h10><titlepage>no</titlepage>";
        assert_eq!(sniff_title(html), None);
    }

    #[test]
    fn test_sniff_title_none() {
        assert_eq!(sniff_title("<p>No heading here</p>"), None);
    }
}
