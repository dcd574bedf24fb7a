//! File-name canonicalization.
//!
//! Report rows, the campaign registry and the master spreadsheet all spell
//! data-file names differently (`Summer_Sale_BSK_2024_1703` vs
//! `summer_sale_2024`). [`normalize`] reduces a raw name to a comparable key:
//!
//! 1. lower-case and trim
//! 2. strip known sponsor/vendor tags (`_tag_` → `_`, trailing `_tag` removed)
//! 3. strip a trailing `_<digits>` sequence id, unless it is a year
//! 4. drop every purely numeric `_`-segment except years (`19xx` / `20xx`),
//!    trimming whitespace around each segment
//!
//! The result is idempotent: normalizing an already normalized key with no
//! tags returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([0-9]+)$").expect("static regex"));

/// Canonicalizes file names against a fixed set of sponsor tags.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    tags: Vec<String>,
}

impl Normalizer {
    pub fn new<S: AsRef<str>>(tags: &[S]) -> Self {
        let tags = tags
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// A normalizer that strips no tags (used for master names).
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut s = raw.to_lowercase().trim().to_string();

        for tag in &self.tags {
            s = s.replace(&format!("_{tag}_"), "_");
            let suffix = format!("_{tag}");
            if let Some(stripped) = s.strip_suffix(&suffix) {
                s = stripped.to_string();
            }
        }

        if let Some(caps) = TRAILING_SEQUENCE.captures(&s) {
            if !is_year(&caps[1]) {
                let start = caps.get(0).map_or(s.len(), |m| m.start());
                s.truncate(start);
            }
        }

        s.split('_')
            .map(str::trim)
            .filter(|part| !is_numeric(part) || is_year(part))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Normalize `raw`, stripping any of `tags` (case-insensitive).
pub fn normalize<S: AsRef<str>>(raw: &str, tags: &[S]) -> String {
    Normalizer::new(tags).normalize(raw)
}

fn is_numeric(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn is_year(part: &str) -> bool {
    part.len() == 4 && is_numeric(part) && (part.starts_with("19") || part.starts_with("20"))
}
