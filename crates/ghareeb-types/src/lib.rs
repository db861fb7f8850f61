//! Shared types for aligning rare-word glosses ("ghareeb") with Mushaf pages.
//!
//! [`GlossEntry`] is created once when the dataset is loaded and stays
//! immutable for the session. Everything else here ([`PhraseMatch`],
//! [`MismatchEntry`], [`MatchingReport`]) is computed fresh for a single
//! render or validation pass and then discarded.
//!
//! Meaning text shown to users always goes through [`resolve_meaning`], so
//! an override layer can shadow the curated meaning without touching the
//! entry itself.
//!
//! ```rust
//! use ghareeb_types::{coverage_percent, unique_key};
//!
//! assert_eq!(unique_key(2, 19, 1), "2_19_1");
//! assert_eq!(coverage_percent(2, 3), 66.67);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of pages in the standard Mushaf print layout.
pub const PAGE_COUNT: u32 = 604;

/// How many pages on each side of the recorded page are searched.
pub const NEIGHBOR_RADIUS: u32 = 2;

/// A curated rare word with its short explanatory meaning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossEntry {
    /// Page the dataset claims the word appears on. Only a hint.
    pub page_number: u32,
    pub word_text: String,
    pub meaning: String,
    pub surah_name: String,
    pub surah_number: u32,
    pub verse_number: u32,
    /// 1-based position of this entry among the entries of its verse.
    pub word_index: u32,
    /// 0-based position in the dataset file.
    pub order: usize,
    /// `surah_verse_n`, unique within a verse across the whole corpus.
    pub unique_key: String,
}

/// Build the `surah_verse_n` key used to identify an entry.
pub fn unique_key(surah: u32, verse: u32, n: u32) -> String {
    format!("{surah}_{verse}_{n}")
}

/// A highlighted occurrence of a gloss entry inside one page line.
///
/// `start`/`end` are byte offsets into the original line, so
/// `&line[m.start..m.end]` is the highlighted text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhraseMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub entry: &'a GlossEntry,
}

impl PhraseMatch<'_> {
    pub fn overlaps(&self, other: &PhraseMatch<'_>) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Why an entry could not be confirmed on its recorded page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    NotFoundInPage,
    PageNumberOff,
    DuplicateMatch,
    PartialMatch,
    Unknown,
}

impl MismatchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MismatchReason::NotFoundInPage => "not_found_in_page",
            MismatchReason::PageNumberOff => "page_number_off",
            MismatchReason::DuplicateMatch => "duplicate_match",
            MismatchReason::PartialMatch => "partial_match",
            MismatchReason::Unknown => "unknown",
        }
    }

    /// Whether the entry still counts toward coverage.
    pub fn counts_as_matched(self) -> bool {
        matches!(self, MismatchReason::PageNumberOff)
    }
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified anomaly found by the validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchEntry {
    pub entry: GlossEntry,
    pub reason: MismatchReason,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_in_pages: Option<Vec<u32>>,
}

/// An entry matched only through its coarse root key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowConfidenceHit {
    pub unique_key: String,
    pub word_text: String,
    pub page_number: u32,
    pub root: String,
    pub token: String,
}

/// Corpus-wide validation result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingReport {
    pub total_entries: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub mismatches: Vec<MismatchEntry>,
    pub coverage_percent: f64,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub reason_counts: BTreeMap<MismatchReason, usize>,
    #[serde(default)]
    pub matched_by: BTreeMap<String, usize>,
    #[serde(default)]
    pub low_confidence: Vec<LowConfidenceHit>,
}

impl MatchingReport {
    /// Copy of the report showing at most `limit` mismatch rows.
    ///
    /// Counts are untouched; only the displayed list shrinks.
    pub fn capped(&self, limit: usize) -> MatchingReport {
        let mut report = self.clone();
        report.mismatches.truncate(limit);
        report
    }
}

/// `round(matched / total * 10000) / 100`, or 0 for an empty corpus.
pub fn coverage_percent(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (matched as f64 / total as f64 * 10000.0).round() / 100.0
}

/// Where a displayed meaning came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeaningSource {
    Override,
    Canonical,
    Missing,
}

/// Meaning text ready for display, with its provenance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedMeaning<'a> {
    pub text: &'a str,
    pub source: MeaningSource,
}

/// A layer that may shadow curated meanings, keyed by `uniqueKey`.
pub trait MeaningLookup {
    fn meaning_for(&self, unique_key: &str) -> Option<&str>;
}

impl MeaningLookup for HashMap<String, String> {
    fn meaning_for(&self, unique_key: &str) -> Option<&str> {
        self.get(unique_key).map(String::as_str)
    }
}

/// Pick the meaning to display for `entry`.
///
/// A non-blank override wins, then the curated meaning, otherwise the
/// result is empty and marked [`MeaningSource::Missing`].
pub fn resolve_meaning<'a, L>(entry: &'a GlossEntry, overrides: Option<&'a L>) -> ResolvedMeaning<'a>
where
    L: MeaningLookup + ?Sized,
{
    if let Some(text) = overrides
        .and_then(|layer| layer.meaning_for(&entry.unique_key))
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        return ResolvedMeaning {
            text,
            source: MeaningSource::Override,
        };
    }

    let canonical = entry.meaning.trim();
    if canonical.is_empty() {
        ResolvedMeaning {
            text: "",
            source: MeaningSource::Missing,
        }
    } else {
        ResolvedMeaning {
            text: canonical,
            source: MeaningSource::Canonical,
        }
    }
}
