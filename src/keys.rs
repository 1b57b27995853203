//! Typed addressing of the persisted collections.
//!
//! The store itself is a flat string namespace. Per-title and per-chapter
//! collections are flattened into it as `<prefix><encodeURIComponent(id)>`,
//! and only [`StoreKey::encode`] / [`StoreKey::parse`] know about that.

use std::fmt;

pub const SITES_KEY: &str = "sites";
pub const TITLES_KEY: &str = "manhuwas";
pub const SELECTED_CHAPTER_KEY: &str = "selectedChapter";
pub const CHAPTERS_PREFIX: &str = "chapters_";
pub const IMAGES_PREFIX: &str = "images_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Sites,
    Titles,
    /// Chapter list of the title with this link.
    Chapters(String),
    /// Image cache of the chapter with this href.
    Images(String),
    SelectedChapter,
    /// Anything not written by the catalog (e.g. brought in by an import).
    Other(String),
}

impl StoreKey {
    pub fn chapters(title_link: &str) -> Self {
        Self::Chapters(title_link.to_owned())
    }

    pub fn images(chapter_href: &str) -> Self {
        Self::Images(chapter_href.to_owned())
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Sites => SITES_KEY.to_owned(),
            Self::Titles => TITLES_KEY.to_owned(),
            Self::Chapters(link) => format!("{CHAPTERS_PREFIX}{}", encode_uri_component(link)),
            Self::Images(href) => format!("{IMAGES_PREFIX}{}", encode_uri_component(href)),
            Self::SelectedChapter => SELECTED_CHAPTER_KEY.to_owned(),
            Self::Other(raw) => raw.clone(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            SITES_KEY => return Self::Sites,
            TITLES_KEY => return Self::Titles,
            SELECTED_CHAPTER_KEY => return Self::SelectedChapter,
            _ => {}
        }

        if let Some(rest) = raw.strip_prefix(CHAPTERS_PREFIX)
            && let Some(link) = decode_uri_component(rest)
        {
            return Self::Chapters(link);
        }
        if let Some(rest) = raw.strip_prefix(IMAGES_PREFIX)
            && let Some(href) = decode_uri_component(rest)
        {
            return Self::Images(href);
        }

        Self::Other(raw.to_owned())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Percent-encodes like JavaScript's `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let is_unreserved = matches!(
            b,
            b'a'..=b'z'
                | b'A'..=b'Z'
                | b'0'..=b'9'
                | b'-'
                | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
        );
        if is_unreserved {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{b:02X}"));
        }
    }
    out
}

/// Inverse of [`encode_uri_component`]. `None` on malformed escapes or
/// non-UTF-8 output.
pub fn decode_uri_component(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            if !hex.bytes().all(|h| h.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
