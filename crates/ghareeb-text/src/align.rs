use std::ops::Range;

/// Normalized text plus its alignment back to the original string.
///
/// `spans[i]` is the byte range in the original text that produced the
/// `i`-th char of `text`. Expanded ligatures share one span and dropped
/// marks extend the span of the letter they follow.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Normalized {
    pub text: String,
    spans: Vec<Range<usize>>,
}

impl Normalized {
    pub(crate) fn from_units(units: Vec<(char, Range<usize>)>) -> Self {
        let mut text = String::with_capacity(units.len() * 2);
        let mut spans = Vec::with_capacity(units.len());
        for (ch, span) in units {
            text.push(ch);
            spans.push(span);
        }
        Self { text, spans }
    }

    /// Number of chars in the normalized text.
    pub fn char_len(&self) -> usize {
        self.spans.len()
    }

    /// Map a normalized byte range `[start, start + len)` to the original.
    ///
    /// Returns `None` for an empty range, a range past the end, or offsets
    /// that do not fall on char boundaries.
    pub fn original_range(&self, start: usize, len: usize) -> Option<Range<usize>> {
        if len == 0 {
            return None;
        }
        let before = self.text.get(..start)?;
        let inside = self.text.get(start..start.checked_add(len)?)?;
        let first = before.chars().count();
        let last = first + inside.chars().count() - 1;
        let start = self.spans.get(first)?.start;
        let end = self.spans.get(last)?.end;
        Some(start..end)
    }

    /// Every non-overlapping occurrence of `needle`, mapped to the original.
    pub fn find_all(&self, needle: &str) -> Vec<Range<usize>> {
        if needle.is_empty() {
            return Vec::new();
        }
        self.text
            .match_indices(needle)
            .filter_map(|(pos, hit)| self.original_range(pos, hit.len()))
            .collect()
    }
}
