use std::collections::HashSet;

use ghareeb_text::{
    Level, LineKind, MIN_MATCH_CHARS, Normalized, TokenKind, char_len, classify_line,
    normalize, normalize_aligned, normalize_surah_name, surah_names_compatible, tokenize,
};
use ghareeb_types::{GlossEntry, PhraseMatch};

/// Keys already highlighted during one page render.
pub type UsedKeys = HashSet<String>;

/// A gloss entry with its comparison keys computed once per render.
#[derive(Clone, Debug)]
pub struct Candidate<'e> {
    pub entry: &'e GlossEntry,
    standard: String,
    aggressive: String,
    surah: String,
}

impl<'e> Candidate<'e> {
    pub fn new(entry: &'e GlossEntry) -> Self {
        Self {
            entry,
            standard: normalize(&entry.word_text, Level::Standard),
            aggressive: normalize(&entry.word_text, Level::Aggressive),
            surah: normalize_surah_name(&entry.surah_name),
        }
    }

    /// Standard-level comparison key of the gloss phrase.
    pub fn phrase(&self) -> &str {
        &self.standard
    }
}

/// Build candidates, longest normalized phrase first.
///
/// Phrases shorter than two chars are dropped; equal lengths keep their
/// input order, so entries of the requested page win ties.
pub fn prepare_candidates<'e>(entries: impl IntoIterator<Item = &'e GlossEntry>) -> Vec<Candidate<'e>> {
    let mut candidates: Vec<Candidate<'e>> = entries
        .into_iter()
        .map(Candidate::new)
        .filter(|c| char_len(&c.standard) >= MIN_MATCH_CHARS)
        .collect();
    candidates.sort_by_key(|c| std::cmp::Reverse(char_len(&c.standard)));
    candidates
}

/// Match candidates against one verse line.
///
/// `surah_context` must come from [`normalize_surah_name`]; empty matches
/// every entry. `used` goes in and the grown set comes back out, so a key
/// already highlighted on this page is never highlighted again. Returned
/// matches never overlap and are in reading order.
pub fn match_line<'e>(
    line: &str,
    candidates: &[Candidate<'e>],
    surah_context: &str,
    used: UsedKeys,
) -> (Vec<PhraseMatch<'e>>, UsedKeys) {
    let standard = normalize_aligned(line, Level::Standard);
    if standard.char_len() < MIN_MATCH_CHARS {
        return (Vec::new(), used);
    }
    let aggressive = normalize_aligned(line, Level::Aggressive);

    let (mut accepted, used) = candidates.iter().fold(
        (Vec::<PhraseMatch<'e>>::new(), used),
        |(mut accepted, mut used), cand| {
            if used.contains(&cand.entry.unique_key)
                || !surah_names_compatible(surah_context, &cand.surah)
            {
                return (accepted, used);
            }

            let found = first_match(&standard, &cand.standard, cand.entry).or_else(|| {
                (char_len(&cand.aggressive) >= MIN_MATCH_CHARS)
                    .then(|| first_match(&aggressive, &cand.aggressive, cand.entry))
                    .flatten()
            });
            if let Some(m) = found
                && !accepted.iter().any(|a| a.overlaps(&m))
            {
                used.insert(cand.entry.unique_key.clone());
                accepted.push(m);
            }
            (accepted, used)
        },
    );

    accepted.sort_by_key(|m| m.start);
    (accepted, used)
}

/// First occurrence of `needle`, mapped to the original line.
fn first_match<'e>(norm: &Normalized, needle: &str, entry: &'e GlossEntry) -> Option<PhraseMatch<'e>> {
    norm.find_all(needle)
        .into_iter()
        .next()
        .map(|r| PhraseMatch {
            start: r.start,
            end: r.end,
            entry,
        })
}

/// One line of a rendered page with its highlights.
#[derive(Clone, Debug)]
pub struct LineMatches<'t, 'e> {
    pub index: usize,
    /// Byte offset of the line within the page text.
    pub offset: usize,
    pub text: &'t str,
    pub kind: LineKind<'t>,
    pub matches: Vec<PhraseMatch<'e>>,
}

/// Run the matcher over every line of a page.
///
/// Surah headers set the context for following lines; headers and
/// Bismillah separators are never matched. The used-key set is threaded
/// through all lines of the page.
pub fn match_page<'t, 'e>(
    page_number: u32,
    text: &'t str,
    candidates: &[Candidate<'e>],
) -> Vec<LineMatches<'t, 'e>> {
    let mut context = String::new();
    let mut used = UsedKeys::new();
    let mut lines = Vec::new();
    let mut offset = 0usize;

    for (index, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let kind = classify_line(line, page_number);
        let matches = match kind {
            LineKind::SurahHeader { name } => {
                context = normalize_surah_name(name);
                Vec::new()
            }
            LineKind::Separator => Vec::new(),
            LineKind::Verse => {
                let (matches, next) = match_line(line, candidates, &context, used);
                used = next;
                matches
            }
        };
        lines.push(LineMatches {
            index,
            offset,
            text: line,
            kind,
            matches,
        });
        offset += raw.len() + 1;
    }

    lines
}

/// A piece of a line for display.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'t, 'e> {
    Plain(&'t str),
    Gloss { text: &'t str, entry: &'e GlossEntry },
    VerseNumber(&'t str),
}

/// Split a line into plain text, gloss click targets and verse markers.
///
/// `matches` must be sorted and non-overlapping, as returned by
/// [`match_line`].
pub fn segment_line<'t, 'e>(line: &'t str, matches: &[PhraseMatch<'e>]) -> Vec<Segment<'t, 'e>> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for m in matches {
        push_unmatched(line, cursor, m.start, &mut segments);
        segments.push(Segment::Gloss {
            text: &line[m.start..m.end],
            entry: m.entry,
        });
        cursor = m.end;
    }
    push_unmatched(line, cursor, line.len(), &mut segments);
    segments
}

fn push_unmatched<'t>(line: &'t str, from: usize, to: usize, out: &mut Vec<Segment<'t, '_>>) {
    if from >= to {
        return;
    }
    let gap = &line[from..to];
    let mut cursor = 0usize;
    for token in tokenize(gap)
        .into_iter()
        .filter(|t| t.kind == TokenKind::VerseNumber)
    {
        if token.start > cursor {
            out.push(Segment::Plain(&gap[cursor..token.start]));
        }
        out.push(Segment::VerseNumber(token.text));
        cursor = token.end;
    }
    if cursor < gap.len() {
        out.push(Segment::Plain(&gap[cursor..]));
    }
}
