use std::ops::Range;

use crate::align::Normalized;

const ALEF: char = 'ا';

/// Strictness of normalization.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Level {
    /// Strip marks, canonicalize alef/yeh/heh/hamza forms, collapse spaces.
    #[default]
    Standard,
    /// Standard plus Persian/swash letterform folding.
    Aggressive,
}

/// What a single original character turns into.
enum Fold {
    Keep(char),
    Expand(&'static str),
    /// Dropped, but belongs to the preceding letter when highlighting.
    Mark,
    Space,
    Drop,
}

/// Normalize `text` to a comparison key.
///
/// Pure and idempotent at both levels. Lam-alef ligatures are already
/// expanded at the standard level; the aggressive level folds single chars
/// of the standard result, so it is never longer.
pub fn normalize(text: &str, level: Level) -> String {
    normalize_aligned(text, level).text
}

/// Normalize `text` and keep the original byte range of every output char.
pub fn normalize_aligned(text: &str, level: Level) -> Normalized {
    let mut units = standard_units(text);
    if level == Level::Aggressive {
        units = aggressive_units(units);
    }
    Normalized::from_units(units)
}

fn standard_units(text: &str) -> Vec<(char, Range<usize>)> {
    let mut units: Vec<(char, Range<usize>)> = Vec::with_capacity(text.len() / 2);
    let mut pending_space: Option<Range<usize>> = None;

    for (pos, ch) in text.char_indices() {
        let span = pos..pos + ch.len_utf8();
        match fold_standard(ch) {
            Fold::Keep(out) => {
                flush_space(&mut units, &mut pending_space);
                units.push((out, span));
            }
            Fold::Expand(out) => {
                flush_space(&mut units, &mut pending_space);
                units.extend(out.chars().map(|c| (c, span.clone())));
            }
            Fold::Mark => {
                if pending_space.is_none()
                    && let Some((last, range)) = units.last_mut()
                    && *last != ' '
                {
                    range.end = span.end;
                }
            }
            Fold::Space => {
                if !units.is_empty() && pending_space.is_none() {
                    pending_space = Some(span);
                }
            }
            Fold::Drop => {}
        }
    }

    units
}

fn flush_space(units: &mut Vec<(char, Range<usize>)>, pending: &mut Option<Range<usize>>) {
    if let Some(span) = pending.take() {
        units.push((' ', span));
    }
}

fn aggressive_units(units: Vec<(char, Range<usize>)>) -> Vec<(char, Range<usize>)> {
    units
        .into_iter()
        .map(|(ch, span)| (fold_variant(ch), span))
        .collect()
}

fn fold_standard(ch: char) -> Fold {
    match ch {
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' | '\u{0672}' | '\u{0673}'
        | '\u{0675}' => Fold::Keep(ALEF),
        '\u{0649}' => Fold::Keep('ي'),
        '\u{0629}' => Fold::Keep('ه'),
        '\u{0624}' | '\u{0676}' => Fold::Keep('و'),
        '\u{0626}' | '\u{0678}' => Fold::Keep('ي'),
        '\u{0621}' | '\u{0674}' | '\u{0640}' => Fold::Mark,
        '\u{FEF5}'..='\u{FEFC}' => Fold::Expand("لا"),
        '\u{FDF2}' => Fold::Expand("الله"),
        c if is_diacritic(c) => Fold::Mark,
        c if c.is_whitespace() => Fold::Space,
        c if is_arabic_letter(c) => Fold::Keep(c),
        _ => Fold::Drop,
    }
}

fn fold_variant(ch: char) -> char {
    match ch {
        '\u{06A9}' | '\u{06AA}' => 'ك',
        '\u{06CC}' | '\u{06CD}' | '\u{06D0}' | '\u{06D2}' => 'ي',
        '\u{06BE}' | '\u{06C0}' | '\u{06C1}' | '\u{06D5}' => 'ه',
        '\u{066E}' => 'ب',
        '\u{066F}' => 'ق',
        '\u{06A1}' => 'ف',
        '\u{06BA}' => 'ن',
        other => other,
    }
}

/// Harakat, Quranic annotation signs and small high/low tajweed letters.
pub fn is_diacritic(ch: char) -> bool {
    matches!(ch,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
        | '\u{08D3}'..='\u{08FF}')
}

/// Base letters of the Arabic block (no marks, digits or symbols).
pub fn is_arabic_letter(ch: char) -> bool {
    matches!(ch,
        '\u{0621}'..='\u{063A}'
        | '\u{0641}'..='\u{064A}'
        | '\u{066E}'..='\u{066F}'
        | '\u{0671}'..='\u{06D3}'
        | '\u{06D5}'
        | '\u{06EE}'..='\u{06EF}'
        | '\u{06FA}'..='\u{06FC}'
        | '\u{06FF}')
}
