//! Formatting utilities: HTML-bearing text → (plain, HTML) pairs and the
//! send / edit payloads built from them.

use std::sync::OnceLock;

use regex::Regex;

use crate::messaging::types::{Relation, TextContent, REL_REPLACE};

const SIGNATURE: &str = "SelfBot";
const EDIT_MARKER: &str = "* ";

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Remove every `<...>` tag, leaving the text between tags.
pub fn strip_tags(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"<[^<>]*>").expect("valid regex"));
    re.replace_all(text, "").into_owned()
}

/// Entity names that HTML5 also recognizes without the closing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

const MAX_ENTITY_NAME: usize = 32;

/// Decode HTML character references the way an HTML5 parser does.
///
/// Every named entity is decoded when terminated by `;`; the legacy Latin-1
/// names also match without it, as the longest prefix of the following
/// word. Numeric references may omit the `;` too. Anything else is kept
/// verbatim.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode the reference at the start of `tail` (which begins with `&`).
/// Returns the replacement and the number of bytes it replaces.
fn decode_reference(tail: &str) -> Option<(String, usize)> {
    let body = &tail[1..];
    if let Some(num) = body.strip_prefix('#') {
        return decode_numeric(num).map(|(c, len)| (c.to_string(), 2 + len));
    }

    let name_len = body
        .bytes()
        .take(MAX_ENTITY_NAME)
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &body[..name_len];

    if body[name_len..].starts_with(';') {
        let reference = &tail[..name_len + 2];
        let decoded = html_escape::decode_html_entities(reference);
        if decoded != reference {
            return Some((decoded.into_owned(), reference.len()));
        }
    }

    (2..=name_len)
        .rev()
        .map(|len| &name[..len])
        .find(|prefix| LEGACY_ENTITIES.contains(prefix))
        .map(|prefix| {
            let decoded = html_escape::decode_html_entities(&format!("&{prefix};")).into_owned();
            (decoded, prefix.len() + 1)
        })
}

/// `NNN` or `xHH` after `&#`, with an optional `;`. Out-of-range and NUL
/// code points become U+FFFD.
fn decode_numeric(num: &str) -> Option<(char, usize)> {
    let (digits, radix, marker) = match num.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16, 1),
        None => (num, 10, 0),
    };

    let len = digits
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }

    let code = u32::from_str_radix(&digits[..len], radix).unwrap_or(u32::MAX);
    let c = char::from_u32(code)
        .filter(|&c| c != '\0')
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    let semi = usize::from(digits[len..].starts_with(';'));
    Some((c, marker + len + semi))
}

/// A message rendered both as plain text and as HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formatted {
    pub plain: String,
    pub html: String,
    /// The input had no markup, no entities and no newlines.
    pub is_plain: bool,
}

/// Derive the plain fallback and the HTML rendering of `text`.
pub fn to_formatted(text: &str) -> Formatted {
    let plain = unescape_html(&strip_tags(text));
    // Compare before newline conversion: a newline alone still needs `<br>`.
    let is_plain = plain == text && !text.contains('\n');
    let html = text.replace('\n', "<br>");
    Formatted {
        plain,
        html,
        is_plain,
    }
}

/// Payload for a fresh bot message: signed, formatted only when needed.
pub fn compose_message(text: &str, source_url: Option<&str>) -> TextContent {
    let f = to_formatted(text);
    let body = format!("{} ({SIGNATURE})", f.plain);
    if f.is_plain {
        return TextContent::plain(body);
    }

    let signature = match source_url {
        Some(url) => format!(" (<a href=\"{}\">{SIGNATURE}</a>)", escape_html(url)),
        None => format!(" ({SIGNATURE})"),
    };
    TextContent::html(body, format!("{}{signature}", f.html))
}

/// Payload that replaces the event `event_id` with `text`.
pub fn compose_edit(event_id: &str, text: &str) -> TextContent {
    let f = to_formatted(text);

    let (mut outer, inner) = if f.is_plain {
        (
            TextContent::plain(format!("{EDIT_MARKER}{}", f.plain)),
            TextContent::plain(f.plain),
        )
    } else {
        (
            TextContent::html(
                format!("{EDIT_MARKER}{}", f.plain),
                format!("{EDIT_MARKER}{}", f.html),
            ),
            TextContent::html(f.plain, f.html),
        )
    };

    outer.new_content = Some(Box::new(inner));
    outer.relates_to = Some(Relation {
        rel_type: REL_REPLACE.to_string(),
        event_id: event_id.to_string(),
    });
    outer
}
