// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTML escaping, comment paragraphs, and parsing of the metadata anchors
//! embedded in index files.
//!
//! Index files double as the storage format: every entry's `index.html`
//! carries its title, comment and data products as attributes of empty
//! `<A CLASS=...>` anchors, which are read back when the log is loaded.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Line break kept inside `LOG:` paragraphs
pub const LINE_BREAK: &str = "<BR>";

/// Paragraphs starting with this marker keep their line breaks
pub const LOG_MARKER: &str = "LOG:";

#[allow(clippy::expect_used)]
static TITLE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<A\s+CLASS="TITLE"\s+TIMESTAMP=([-+0-9.eE]+)\s*>(.*?)</A>"#)
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static COMMENTS_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<A\s+CLASS="COMMENTS"\s*>(.*?)</A>"#).expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<P>(.*?)</P>").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static DP_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<A\s+CLASS="DP"([^>]*)>\s*</A>"#).expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_]+)=(?:"([^"]*)"|([^\s"]+))"#).expect("constant regex pattern is valid")
});

/// Escape text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Percent-encode characters that would break a relative URL
pub fn quote_url(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'/' | b'.' | b'-' | b'_' | b'~' => {
                out.push(b as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Turn comment text as typed by the user into its stored form.
///
/// Blank lines separate paragraphs; single newlines inside a paragraph
/// become spaces, except in paragraphs starting with `LOG:`, where they are
/// kept as `<BR>`. Stored paragraphs are separated by single newlines.
pub fn reflow_comment(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    text.split("\n\n")
        .map(|par| {
            if par.starts_with(LOG_MARKER) {
                par.replace('\n', LINE_BREAK)
            } else {
                par.replace('\n', " ")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`reflow_comment`]: the stored form as the user would type it
pub fn editable_comment(stored: &str) -> String {
    stored.replace('\n', "\n\n").replace(LINE_BREAK, "\n")
}

/// Render a stored comment as `<P>` elements, one per line
pub fn render_comment(stored: &str) -> String {
    let mut html = String::new();
    for par in stored.split('\n') {
        let escaped: Vec<String> = par.split(LINE_BREAK).map(escape).collect();
        html.push_str("      <P>");
        html.push_str(&escaped.join(LINE_BREAK));
        html.push_str("</P>\n");
    }
    html
}

/// Metadata recovered from an entry's `index.html`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    pub title: Option<String>,
    pub timestamp: Option<f64>,
    pub comment: Option<String>,
    /// Attributes of every `DP` anchor, in document order, keys upper-cased
    pub products: Vec<HashMap<String, String>>,
}

/// Title and timestamp from a `TITLE` anchor
pub fn parse_title(html: &str) -> (Option<String>, Option<f64>) {
    match TITLE_ANCHOR.captures(html) {
        Some(caps) => {
            let timestamp = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            let title = caps.get(2).map(|m| unescape(m.as_str().trim()));
            (title, timestamp)
        }
        None => (None, None),
    }
}

pub fn parse_entry(html: &str) -> ParsedEntry {
    let (title, timestamp) = parse_title(html);
    let comment = COMMENTS_ANCHOR.captures(html).and_then(|caps| caps.get(1)).map(|body| {
        PARAGRAPH
            .captures_iter(body.as_str())
            .filter_map(|p| p.get(1))
            .map(|p| p.as_str().split(LINE_BREAK).map(unescape).collect::<Vec<_>>().join(LINE_BREAK))
            .collect::<Vec<_>>()
            .join("\n")
    });
    let products = DP_ANCHOR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|attrs| parse_attributes(attrs.as_str()))
        .collect();
    ParsedEntry { title, timestamp, comment, products }
}

fn parse_attributes(text: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(text)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_uppercase();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((key, unescape(value)))
        })
        .collect()
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod tests;
