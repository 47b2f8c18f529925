// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered fallback pattern chains for the five project fields.
//!
//! Each field is resolved by a [`PatternChain`]: a ranked list of
//! [`PatternRule`]s tried in order against the page text. A rule's raw
//! capture goes through the rule's cleanup steps and then the chain's
//! acceptance check; the first accepted value wins and later rules are not
//! evaluated.
//!
//! The portal has no stable labeling, so the chains run from the most
//! explicit label down to bare structural shapes. Patterns are matched
//! case-insensitively. Section boundaries are consumed as a trailing
//! non-capturing alternation after a lazy capture, which yields the same
//! capture as a lookahead would.

use crate::record::ProjectRecord;
use crate::text::{char_len, collapse_commas, collapse_whitespace, heading_texts, truncate_at};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// The extracted columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegistrationNumber,
    ProjectName,
    PromoterName,
    PromoterAddress,
    TaxId,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegistrationNumber => "registration_number",
            Self::ProjectName => "project_name",
            Self::PromoterName => "promoter_name",
            Self::PromoterAddress => "promoter_address",
            Self::TaxId => "tax_id",
        }
    }
}

/// Which part of a match becomes the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Group(usize),
    Whole,
}

/// Post-match cleanup, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    Trim,
    CollapseWhitespace,
    CollapseCommas,
    /// Drop everything from the first case-insensitive occurrence onward.
    TruncateAt(&'static str),
}

impl Cleanup {
    fn apply(self, s: String) -> String {
        match self {
            Self::Trim => s.trim().to_string(),
            Self::CollapseWhitespace => collapse_whitespace(&s),
            Self::CollapseCommas => collapse_commas(&s),
            Self::TruncateAt(needle) => truncate_at(&s, needle),
        }
    }
}

/// What a cleaned value must satisfy to end the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    NonEmpty,
    /// More than this many characters.
    LongerThan(usize),
    /// Exactly this many characters.
    Exactly(usize),
}

impl Accept {
    fn check(self, s: &str) -> bool {
        let len = char_len(s);
        match self {
            Self::NonEmpty => len > 0,
            Self::LongerThan(n) => len > n,
            Self::Exactly(n) => len == n,
        }
    }
}

/// One recognizer in a chain.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    capture: Capture,
    cleanup: &'static [Cleanup],
}

impl PatternRule {
    /// Compile a rule. Patterns are built-in constants, so a bad pattern is a
    /// programming error.
    pub fn new(pattern: &str, capture: Capture, cleanup: &'static [Cleanup]) -> Self {
        let regex = Regex::new(&format!("(?i){pattern}")).expect("field pattern regex is valid");
        Self {
            regex,
            capture,
            cleanup,
        }
    }

    /// First match in `text`, cleaned. `None` when the pattern does not match.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let raw = match self.capture {
            Capture::Group(i) => caps.get(i)?.as_str(),
            Capture::Whole => caps.get(0)?.as_str(),
        };
        Some(
            self.cleanup
                .iter()
                .fold(raw.to_string(), |acc, step| step.apply(acc)),
        )
    }
}

/// Ranked recognizers for one field.
#[derive(Debug, Clone)]
pub struct PatternChain {
    pub field: Field,
    rules: Vec<PatternRule>,
    accept: Accept,
    /// Values rejected regardless of length, compared case-insensitively.
    placeholders: &'static [&'static str],
}

impl PatternChain {
    pub fn new(field: Field, rules: Vec<PatternRule>, accept: Accept) -> Self {
        Self {
            field,
            rules,
            accept,
            placeholders: &[],
        }
    }

    pub fn with_placeholders(mut self, words: &'static [&'static str]) -> Self {
        self.placeholders = words;
        self
    }

    /// Resolve the field, returning the winning rule's rank and value.
    pub fn resolve_ranked(&self, text: &str) -> Option<(usize, String)> {
        self.rules.iter().enumerate().find_map(|(rank, rule)| {
            let value = rule.apply(text)?;
            self.accepts(&value).then_some((rank, value))
        })
    }

    /// Resolve the field.
    pub fn resolve(&self, text: &str) -> Option<String> {
        let (rank, value) = self.resolve_ranked(text)?;
        debug!(field = self.field.as_str(), rule = rank, value = %value, "field resolved");
        Some(value)
    }

    fn accepts(&self, value: &str) -> bool {
        self.accept.check(value)
            && !self
                .placeholders
                .iter()
                .any(|p| p.eq_ignore_ascii_case(value))
    }
}

// ── Chains ───────────────────────────────────────────────────────────────────

const REG_CLEANUP: &[Cleanup] = &[Cleanup::TruncateAt("registration"), Cleanup::Trim];
const NAME_CLEANUP: &[Cleanup] = &[Cleanup::Trim, Cleanup::CollapseWhitespace];
const PROMOTER_CLEANUP: &[Cleanup] = &[
    Cleanup::Trim,
    Cleanup::CollapseWhitespace,
    Cleanup::TruncateAt("company logo"),
    Cleanup::Trim,
];
const ADDRESS_CLEANUP: &[Cleanup] = &[
    Cleanup::Trim,
    Cleanup::CollapseWhitespace,
    Cleanup::CollapseCommas,
];
const GST_CLEANUP: &[Cleanup] = &[Cleanup::Trim];

/// Words that are section titles rather than project names.
pub const NAME_PLACEHOLDERS: &[&str] = &["projects", "project", "details"];

/// Heading texts that belong to the portal chrome.
pub const HEADING_PLACEHOLDERS: &[&str] = &["projects", "project", "details", "orera", "authority"];

const REG_VALUE: &str = r"([A-Z0-9/\-\.]+)";
const NAME_END: &str = r"(?:\s*Project\s*Type|\s*RERA|\s*Registration|\n|$)";
const PROMOTER_VALUE: &str = r"([M/S\.\s]*[A-Z][A-Za-z0-9\s\.,&\-()]+?)";
const PROMOTER_END: &str = r"(?:\s*Company|\s*Registration|\s*Email|\n\s*\n|$)";
const COMPANY_END: &str =
    r"(?:\s*Company\s*Logo|\s*Registration|\s*Correspondence|\s*Email|\n\s*\n|$)";
const ADDRESS_VALUE: &str = r"([A-Za-z0-9\s,\-\.:/()]+?)";
const ADDRESS_END: &str = r"(?:\s*,{3,}|\s*Entity|\s*Email|\s*Mobile|\s*Phone|\n\s*\n|$)";

/// RERA registration number, e.g. `RP/01/2024/01234`.
pub fn registration_chain() -> &'static PatternChain {
    static CHAIN: OnceLock<PatternChain> = OnceLock::new();
    CHAIN.get_or_init(|| {
        let labeled = |label: &str| {
            PatternRule::new(
                &format!(r"{label}\s*:?\s*{REG_VALUE}"),
                Capture::Group(1),
                REG_CLEANUP,
            )
        };
        PatternChain::new(
            Field::RegistrationNumber,
            vec![
                labeled(r"RERA\s*Reg(?:d|istration)?\.?\s*No\.?"),
                labeled(r"Registration\s*No\.?"),
                labeled(r"Reg\.?\s*No\.?"),
                PatternRule::new(r"RP/\d+/\d+/\d+", Capture::Whole, REG_CLEANUP),
                PatternRule::new(r"[A-Z]{2}/\d+/\d+/\d+", Capture::Whole, REG_CLEANUP),
            ],
            Accept::NonEmpty,
        )
    })
}

/// Labeled project name. The heading fallback lives in [`project_name`].
pub fn project_name_chain() -> &'static PatternChain {
    static CHAIN: OnceLock<PatternChain> = OnceLock::new();
    CHAIN.get_or_init(|| {
        let value = r"([A-Za-z0-9\s\-\.,&()]+?)";
        PatternChain::new(
            Field::ProjectName,
            vec![
                PatternRule::new(
                    &format!(r"Project\s*Name\s*:?\s*{value}{NAME_END}"),
                    Capture::Group(1),
                    NAME_CLEANUP,
                ),
                PatternRule::new(
                    &format!(r"Project\s*Name\s*{value}{NAME_END}"),
                    Capture::Group(1),
                    NAME_CLEANUP,
                ),
            ],
            Accept::LongerThan(3),
        )
        .with_placeholders(NAME_PLACEHOLDERS)
    })
}

/// Promoter (company) name.
pub fn promoter_name_chain() -> &'static PatternChain {
    static CHAIN: OnceLock<PatternChain> = OnceLock::new();
    CHAIN.get_or_init(|| {
        let rule = |pattern: String| PatternRule::new(&pattern, Capture::Group(1), PROMOTER_CLEANUP);
        PatternChain::new(
            Field::PromoterName,
            vec![
                rule(format!(r"Company\s*Name\s*:?\s*{PROMOTER_VALUE}{COMPANY_END}")),
                rule(format!(r"Promoter\s*Name\s*:?\s*{PROMOTER_VALUE}{PROMOTER_END}")),
                rule(format!(r"Promoter\s*:?\s*{PROMOTER_VALUE}{PROMOTER_END}")),
                rule(format!(r"M/S\.\s*([A-Z][A-Za-z0-9\s\.,&\-()]+?){PROMOTER_END}")),
            ],
            Accept::LongerThan(3),
        )
    })
}

/// Registered office address of the promoter.
pub fn promoter_address_chain() -> &'static PatternChain {
    static CHAIN: OnceLock<PatternChain> = OnceLock::new();
    CHAIN.get_or_init(|| {
        let rule = |label: &str| {
            PatternRule::new(
                &format!(r"{label}\s*:?\s*{ADDRESS_VALUE}{ADDRESS_END}"),
                Capture::Group(1),
                ADDRESS_CLEANUP,
            )
        };
        PatternChain::new(
            Field::PromoterAddress,
            vec![
                rule(r"Registered\s*Office\s*Address"),
                rule(r"Office\s*Address"),
                rule(r"Address"),
            ],
            Accept::LongerThan(10),
        )
    })
}

/// GSTIN: two state digits, a ten-character PAN, entity code, `Z`, checksum.
pub fn tax_id_chain() -> &'static PatternChain {
    static CHAIN: OnceLock<PatternChain> = OnceLock::new();
    CHAIN.get_or_init(|| {
        let labeled = |label: &str| {
            PatternRule::new(
                &format!(r"{label}\s*:?\s*([A-Z0-9]+)"),
                Capture::Group(1),
                GST_CLEANUP,
            )
        };
        PatternChain::new(
            Field::TaxId,
            vec![
                labeled(r"GST\s*No\.?"),
                labeled(r"GSTIN"),
                labeled(r"GST"),
                PatternRule::new(
                    r"([0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z])",
                    Capture::Group(1),
                    GST_CLEANUP,
                ),
            ],
            Accept::Exactly(15),
        )
    })
}

// ── Field resolution ─────────────────────────────────────────────────────────

/// Project name from its label, falling back to the first meaningful heading.
pub fn project_name(text: &str, html: &str) -> Option<String> {
    if let Some(name) = project_name_chain().resolve(text) {
        return Some(name);
    }
    let heading = heading_texts(html).into_iter().find(|t| {
        char_len(t) > 3
            && !HEADING_PLACEHOLDERS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(t))
            && !t.to_ascii_lowercase().contains("logo")
    });
    if let Some(h) = &heading {
        debug!(field = "project_name", value = %h, "field resolved from heading");
    }
    heading
}

/// Fill the fields visible on the initial render.
pub fn apply_overview(record: &mut ProjectRecord, text: &str, html: &str) {
    record.registration_number = registration_chain().resolve(text).unwrap_or_default();
    record.project_name = project_name(text, html).unwrap_or_default();
}

/// Fill the fields shown on the promoter tab.
pub fn apply_promoter(record: &mut ProjectRecord, text: &str) {
    record.promoter_name = promoter_name_chain().resolve(text).unwrap_or_default();
    record.promoter_address = promoter_address_chain().resolve(text).unwrap_or_default();
    record.tax_id = tax_id_chain().resolve(text).unwrap_or_default();
}
