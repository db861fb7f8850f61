//! Corpus-wide audit of the gloss dataset against the page text.
//!
//! Every entry is checked against the page it claims to be on, walking a
//! ladder of increasingly lenient [`MatchStrategy`] rungs; the first hit
//! wins. Entries are grouped by expected page and the groups are audited
//! in parallel, since no state crosses page boundaries.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info};

use ghareeb_data::{GlossIndex, PageCorpus};
use ghareeb_text::{
    Level, LineKind, MIN_MATCH_CHARS, char_len, classify_line, extract_root, normalize,
};
use ghareeb_types::{
    GlossEntry, LowConfidenceHit, MatchingReport, MismatchEntry, MismatchReason, NEIGHBOR_RADIUS,
    coverage_percent,
};

/// Prefix/suffix length for the partial-match rung.
const AFFIX_CHARS: usize = 3;
/// Allowed length difference between an entry and a root-matched token.
const ROOT_LEN_SLACK: usize = 2;

const TOO_SHORT: &str = "too_short";
const NEIGHBOR_PAGE: &str = "neighbor_page";

/// Comparison keys of one gloss word.
#[derive(Clone, Debug)]
pub struct PreparedWord {
    pub standard: String,
    pub aggressive: String,
    pub root: String,
}

impl PreparedWord {
    pub fn new(word: &str) -> Self {
        Self {
            standard: normalize(word, Level::Standard),
            aggressive: normalize(word, Level::Aggressive),
            root: extract_root(word),
        }
    }
}

#[derive(Clone, Debug)]
struct PageToken {
    text: String,
    root: String,
    len: usize,
}

/// Comparison keys of one corpus page, built from its verse lines only.
#[derive(Clone, Debug)]
pub struct PreparedPage {
    pub standard: String,
    pub aggressive: String,
    tokens: Vec<PageToken>,
}

impl PreparedPage {
    pub fn new(page_number: u32, text: &str) -> Self {
        let body = text
            .lines()
            .filter(|line| matches!(classify_line(line, page_number), LineKind::Verse))
            .collect::<Vec<_>>()
            .join("\n");
        let standard = normalize(&body, Level::Standard);
        let aggressive = normalize(&standard, Level::Aggressive);
        let tokens = aggressive
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(|t| PageToken {
                text: t.to_string(),
                root: extract_root(t),
                len: char_len(t),
            })
            .collect();
        Self {
            standard,
            aggressive,
            tokens,
        }
    }
}

/// What a rung found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Evidence {
    Substring,
    /// Only the coarse root matched; never definitive.
    Root { token: String, root: String },
}

/// One rung of the validation ladder.
pub trait MatchStrategy: Send + Sync {
    /// Name used in the report's `matchedBy` counts.
    fn name(&self) -> &'static str;
    fn try_match(&self, word: &PreparedWord, page: &PreparedPage) -> Option<Evidence>;
}

/// Standard-level substring search.
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn try_match(&self, word: &PreparedWord, page: &PreparedPage) -> Option<Evidence> {
        page.standard
            .contains(word.standard.as_str())
            .then_some(Evidence::Substring)
    }
}

/// Aggressive-level substring search.
pub struct AggressiveMatch;

impl MatchStrategy for AggressiveMatch {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn try_match(&self, word: &PreparedWord, page: &PreparedPage) -> Option<Evidence> {
        (char_len(&word.aggressive) >= MIN_MATCH_CHARS
            && page.aggressive.contains(word.aggressive.as_str()))
        .then_some(Evidence::Substring)
    }
}

/// Aggressive search with a leading alef removed.
pub struct AlefDroppedMatch;

impl MatchStrategy for AlefDroppedMatch {
    fn name(&self) -> &'static str {
        "alef_dropped"
    }

    fn try_match(&self, word: &PreparedWord, page: &PreparedPage) -> Option<Evidence> {
        let rest = word.aggressive.strip_prefix('ا')?;
        (char_len(rest) >= MIN_MATCH_CHARS && page.aggressive.contains(rest))
            .then_some(Evidence::Substring)
    }
}

/// Root comparison against every page token of similar length.
pub struct RootMatch;

impl MatchStrategy for RootMatch {
    fn name(&self) -> &'static str {
        "root"
    }

    fn try_match(&self, word: &PreparedWord, page: &PreparedPage) -> Option<Evidence> {
        if char_len(&word.root) < MIN_MATCH_CHARS {
            return None;
        }
        let len = char_len(&word.aggressive);
        page.tokens
            .iter()
            .find(|t| t.root == word.root && t.len.abs_diff(len) <= ROOT_LEN_SLACK)
            .map(|t| Evidence::Root {
                token: t.text.clone(),
                root: word.root.clone(),
            })
    }
}

/// Presence of the word's first or last three chars.
pub struct AffixMatch;

impl AffixMatch {
    fn find(&self, word: &PreparedWord, page: &PreparedPage) -> Option<String> {
        let chars: Vec<char> = word.standard.chars().collect();
        if chars.len() < AFFIX_CHARS {
            return None;
        }
        let prefix: String = chars[..AFFIX_CHARS].iter().collect();
        if page.standard.contains(prefix.as_str()) {
            return Some(format!("prefix «{prefix}» found"));
        }
        let suffix: String = chars[chars.len() - AFFIX_CHARS..].iter().collect();
        page.standard
            .contains(suffix.as_str())
            .then(|| format!("suffix «{suffix}» found"))
    }
}

enum Verdict {
    Matched(&'static str),
    RootOnly { token: String, root: String },
    Mismatch {
        reason: MismatchReason,
        detail: String,
        found_in_pages: Option<Vec<u32>>,
    },
}

#[derive(Default)]
struct PageOutcome {
    total: usize,
    matched: usize,
    matched_by: BTreeMap<String, usize>,
    mismatches: Vec<MismatchEntry>,
    low_confidence: Vec<LowConfidenceHit>,
}

/// The validation ladder.
///
/// Rungs fixed in place: too short, exact (with duplicate claims),
/// neighbouring pages, partial, not found. The lenient rungs tried between
/// exact and neighbouring pages are configurable.
pub struct Validator {
    fallbacks: Vec<Box<dyn MatchStrategy>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_fallbacks(vec![
            Box::new(AggressiveMatch),
            Box::new(AlefDroppedMatch),
            Box::new(RootMatch),
        ])
    }
}

impl Validator {
    pub fn with_fallbacks(fallbacks: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { fallbacks }
    }

    /// Audit every entry of `index` against `corpus`.
    pub fn validate(&self, index: &GlossIndex, corpus: &PageCorpus) -> MatchingReport {
        let started = Instant::now();
        let texts: Vec<(u32, &str)> = corpus.iter().collect();
        let pages: Vec<PreparedPage> = texts
            .par_iter()
            .map(|(number, text)| PreparedPage::new(*number, text))
            .collect();

        let groups: Vec<(u32, &[GlossEntry])> = index.pages().collect();
        let outcomes: Vec<PageOutcome> = groups
            .par_iter()
            .map(|(page, entries)| self.validate_page(*page, entries, &pages))
            .collect();

        let mut total = 0usize;
        let mut matched = 0usize;
        let mut matched_by: BTreeMap<String, usize> = BTreeMap::new();
        let mut mismatches = Vec::new();
        let mut low_confidence = Vec::new();
        for outcome in outcomes {
            total += outcome.total;
            matched += outcome.matched;
            for (name, count) in outcome.matched_by {
                *matched_by.entry(name).or_default() += count;
            }
            mismatches.extend(outcome.mismatches);
            low_confidence.extend(outcome.low_confidence);
        }

        let mut reason_counts: BTreeMap<MismatchReason, usize> = BTreeMap::new();
        for mismatch in &mismatches {
            *reason_counts.entry(mismatch.reason).or_default() += 1;
        }

        let report = MatchingReport {
            total_entries: total,
            matched_count: matched,
            unmatched_count: total - matched,
            mismatches,
            coverage_percent: coverage_percent(matched, total),
            generated_at: Utc::now(),
            reason_counts,
            matched_by,
            low_confidence,
        };
        info!(
            "validated {} entries in {} ms: {} matched, {} unmatched ({}% coverage), {} low-confidence",
            report.total_entries,
            started.elapsed().as_millis(),
            report.matched_count,
            report.unmatched_count,
            report.coverage_percent,
            report.low_confidence.len()
        );
        report
    }

    fn validate_page(&self, page: u32, entries: &[GlossEntry], pages: &[PreparedPage]) -> PageOutcome {
        let mut outcome = PageOutcome::default();
        let mut claims: HashSet<String> = HashSet::new();

        for entry in entries {
            outcome.total += 1;
            let word = PreparedWord::new(&entry.word_text);
            match self.classify(entry, &word, pages, &mut claims) {
                Verdict::Matched(by) => {
                    outcome.matched += 1;
                    *outcome.matched_by.entry(by.to_string()).or_default() += 1;
                }
                Verdict::RootOnly { token, root } => {
                    outcome.matched += 1;
                    *outcome.matched_by.entry(RootMatch.name().to_string()).or_default() += 1;
                    outcome.low_confidence.push(LowConfidenceHit {
                        unique_key: entry.unique_key.clone(),
                        word_text: entry.word_text.clone(),
                        page_number: entry.page_number,
                        root,
                        token,
                    });
                }
                Verdict::Mismatch {
                    reason,
                    detail,
                    found_in_pages,
                } => {
                    if reason.counts_as_matched() {
                        outcome.matched += 1;
                        *outcome.matched_by.entry(NEIGHBOR_PAGE.to_string()).or_default() += 1;
                    }
                    debug!("{} on page {}: {} ({})", entry.unique_key, page, reason, detail);
                    outcome.mismatches.push(MismatchEntry {
                        entry: entry.clone(),
                        reason,
                        detail,
                        found_in_pages,
                    });
                }
            }
        }

        outcome
    }

    fn classify(
        &self,
        entry: &GlossEntry,
        word: &PreparedWord,
        pages: &[PreparedPage],
        claims: &mut HashSet<String>,
    ) -> Verdict {
        if char_len(&word.standard) < MIN_MATCH_CHARS {
            return Verdict::Matched(TOO_SHORT);
        }
        let page = entry.page_number;
        let Some(expected) = page_at(pages, page) else {
            return match neighbor_verdict(word, page, pages) {
                Some(verdict) => verdict,
                None => Verdict::Mismatch {
                    reason: MismatchReason::Unknown,
                    detail: format!("page {page} is not in the corpus"),
                    found_in_pages: None,
                },
            };
        };

        if ExactMatch.try_match(word, expected).is_some() {
            if !claims.insert(word.standard.clone()) {
                return Verdict::Mismatch {
                    reason: MismatchReason::DuplicateMatch,
                    detail: format!("already claimed on page {page} by an earlier entry"),
                    found_in_pages: None,
                };
            }
            return Verdict::Matched(ExactMatch.name());
        }

        for strategy in &self.fallbacks {
            match strategy.try_match(word, expected) {
                Some(Evidence::Substring) => return Verdict::Matched(strategy.name()),
                Some(Evidence::Root { token, root }) => return Verdict::RootOnly { token, root },
                None => {}
            }
        }

        if let Some(verdict) = neighbor_verdict(word, page, pages) {
            return verdict;
        }

        if let Some(detail) = AffixMatch.find(word, expected) {
            return Verdict::Mismatch {
                reason: MismatchReason::PartialMatch,
                detail: format!("{detail} on page {page}"),
                found_in_pages: None,
            };
        }

        Verdict::Mismatch {
            reason: MismatchReason::NotFoundInPage,
            detail: format!("not found on page {page} or within {NEIGHBOR_RADIUS} pages of it"),
            found_in_pages: None,
        }
    }
}

/// Audit with the default ladder.
pub fn validate(index: &GlossIndex, corpus: &PageCorpus) -> MatchingReport {
    Validator::default().validate(index, corpus)
}

fn page_at(pages: &[PreparedPage], page: u32) -> Option<&PreparedPage> {
    let idx = usize::try_from(page).ok()?.checked_sub(1)?;
    pages.get(idx)
}

fn neighbor_verdict(word: &PreparedWord, page: u32, pages: &[PreparedPage]) -> Option<Verdict> {
    let found = neighbor_hits(word, page, pages);
    if found.is_empty() {
        return None;
    }
    let list = found
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(Verdict::Mismatch {
        reason: MismatchReason::PageNumberOff,
        detail: format!("recorded on page {page}, found on page {list}"),
        found_in_pages: Some(found),
    })
}

/// Neighbouring pages, ascending, where an exact or aggressive search hits.
fn neighbor_hits(word: &PreparedWord, page: u32, pages: &[PreparedPage]) -> Vec<u32> {
    let low = page.saturating_sub(NEIGHBOR_RADIUS).max(1);
    let high = page.saturating_add(NEIGHBOR_RADIUS);
    (low..=high)
        .filter(|&p| p != page)
        .filter(|&p| {
            page_at(pages, p).is_some_and(|prepared| {
                ExactMatch.try_match(word, prepared).is_some()
                    || AggressiveMatch.try_match(word, prepared).is_some()
            })
        })
        .collect()
}
