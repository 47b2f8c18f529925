// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page text capture and string normalization.
//!
//! These helpers are synchronous because the `scraper` crate's types are
//! `!Send`; callers parse, extract a `String`, and drop the document before
//! the next await point.

use scraper::{Html, Node, Selector};

/// Elements whose text never renders.
const HIDDEN_TEXT_PARENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Rendered text of a whole page.
///
/// Text nodes are concatenated in document order without separators, so the
/// line structure of the markup survives. Label patterns rely on blank lines
/// and line breaks as section boundaries.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| HIDDEN_TEXT_PARENTS.contains(&name));
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

/// Text of every `h1`–`h4`, in document order, trimmed and whitespace-collapsed.
pub fn heading_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(sel) = Selector::parse("h1, h2, h3, h4") else {
        return Vec::new();
    };
    document
        .select(&sel)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Trim and fold every whitespace run into a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold runs of commas into a single comma.
pub fn collapse_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_comma = false;
    for c in s.chars() {
        if c == ',' {
            if !prev_comma {
                out.push(c);
            }
            prev_comma = true;
        } else {
            out.push(c);
            prev_comma = false;
        }
    }
    out
}

/// Cut `s` at the first ASCII case-insensitive occurrence of `needle`.
pub fn truncate_at(s: &str, needle: &str) -> String {
    let n = needle.as_bytes();
    if n.is_empty() || n.len() > s.len() {
        return s.to_string();
    }
    match s
        .as_bytes()
        .windows(n.len())
        .position(|w| w.eq_ignore_ascii_case(n))
    {
        Some(pos) => s[..pos].to_string(),
        None => s.to_string(),
    }
}

/// Length in characters.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
