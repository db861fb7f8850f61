use crate::normalize::{Level, normalize};

/// Normalized first token of a surah-header line.
pub const SURAH_MARKER: &str = "سوره";

/// Normalized Bismillah; lines containing it separate chapters.
pub const BISMILLAH: &str = "بسم الله الرحمن الرحيم";

const VERSE_BRACKETS: &[char] = &['﴿', '﴾', '(', ')', '[', ']', '{', '}', '۝'];

/// Role of one line of page text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineKind<'a> {
    /// `سورة <name>`; `name` borrows from the original line.
    SurahHeader { name: &'a str },
    /// Bismillah between chapters, never matched.
    Separator,
    /// Ordinary verse text.
    Verse,
}

/// Classify a page line. On page 1 the Bismillah is verse 1 of al-Fatiha,
/// so it is reported as [`LineKind::Verse`] there.
pub fn classify_line(line: &str, page_number: u32) -> LineKind<'_> {
    let trimmed = line.trim();
    if let Some(first) = trimmed.split_whitespace().next()
        && normalize(first, Level::Standard) == SURAH_MARKER
    {
        let name = trimmed[first.len()..].trim();
        return LineKind::SurahHeader { name };
    }

    if page_number != 1 && normalize(trimmed, Level::Standard).contains(BISMILLAH) {
        return LineKind::Separator;
    }

    LineKind::Verse
}

/// Canonical form of a surah name for context comparison.
///
/// Drops a leading `سورة` so "سورة البقرة" and "البقرة" agree.
pub fn normalize_surah_name(name: &str) -> String {
    let norm = normalize(name, Level::Standard);
    match norm.strip_prefix(SURAH_MARKER) {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim_start().to_string(),
        _ => norm,
    }
}

/// Whether an entry's surah fits the line's current surah context.
///
/// Both arguments must already be passed through [`normalize_surah_name`].
/// An empty side matches anything.
pub fn surah_names_compatible(context: &str, entry_surah: &str) -> bool {
    if context.is_empty() || entry_surah.is_empty() {
        return true;
    }
    context == entry_surah || context.contains(entry_surah) || entry_surah.contains(context)
}

/// Whether a whitespace-delimited token is a verse-number marker.
///
/// Runs of ASCII, Arabic-Indic or extended Arabic-Indic digits, optionally
/// wrapped in ornate or plain brackets.
pub fn is_verse_number(token: &str) -> bool {
    let digits = token.trim_matches(|c: char| VERSE_BRACKETS.contains(&c));
    !digits.is_empty()
        && digits.chars().all(|c| {
            c.is_ascii_digit() || ('\u{0660}'..='\u{0669}').contains(&c) || ('\u{06F0}'..='\u{06F9}').contains(&c)
        })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Word,
    VerseNumber,
}

/// A whitespace-delimited token with its byte range in the line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

/// Split a line on whitespace, tagging verse-number markers.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (pos, ch) in line.char_indices().chain(std::iter::once((line.len(), ' '))) {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                let text = &line[s..pos];
                let kind = if is_verse_number(text) {
                    TokenKind::VerseNumber
                } else {
                    TokenKind::Word
                };
                tokens.push(Token {
                    text,
                    start: s,
                    end: pos,
                    kind,
                });
                start = None;
            }
            (false, None) => start = Some(pos),
            _ => {}
        }
    }
    tokens
}
