//! Comparison keys for Quranic Arabic text.
//!
//! Mushaf text carries full tashkil, tajweed marks and alternate letterforms
//! while curated glosses usually do not. Everything in this crate turns both
//! sides into canonical strings that are only ever compared, never shown.
//!
//! # How it works
//! 1. [`normalize`] folds text at one of two [`Level`]s. The standard level
//!    strips marks and canonicalizes alef/yeh/heh/hamza forms; the aggressive
//!    level additionally folds Persian and swash letterform variants.
//! 2. [`normalize_aligned`] does the same while recording, for every
//!    normalized character, the byte range of the original text it came
//!    from, so a substring hit can be highlighted in the original line.
//! 3. [`extract_root`] derives a coarse fuzzy key for last-resort matching.
//! 4. [`classify_line`] recognises surah headers and Bismillah separators,
//!    and [`tokenize`] separates verse-number markers from words.
//!
//! # Example
//! ```rust
//! use ghareeb_text::{Level, normalize, normalize_aligned};
//!
//! assert_eq!(normalize("ٱلرَّحۡمَـٰنِ", Level::Standard), "الرحمن");
//!
//! let line = "بِسۡمِ ٱللَّهِ";
//! let norm = normalize_aligned(line, Level::Standard);
//! let hit = norm.text.find("الله").unwrap();
//! let range = norm.original_range(hit, "الله".len()).unwrap();
//! assert_eq!(&line[range], "ٱللَّهِ");
//! ```

mod align;
mod lines;
mod normalize;
mod root;

pub use align::Normalized;
pub use lines::{
    BISMILLAH, LineKind, SURAH_MARKER, Token, TokenKind, classify_line, is_verse_number,
    normalize_surah_name, surah_names_compatible, tokenize,
};
pub use normalize::{Level, is_arabic_letter, is_diacritic, normalize, normalize_aligned};
pub use root::{ROOT_LEN, extract_root};

/// Normalized strings shorter than this are too ambiguous to match.
pub const MIN_MATCH_CHARS: usize = 2;

/// Character count of a string, the unit all length rules are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
