use crate::normalize::{Level, normalize};

/// Maximum length of a root key.
pub const ROOT_LEN: usize = 4;

/// Coarse fuzzy key: aggressive form without weak letters, first 4 chars.
///
/// Only good enough for a low-confidence fallback. Two unrelated words can
/// share a root key, so a root hit is never a definitive match.
pub fn extract_root(word: &str) -> String {
    normalize(word, Level::Aggressive)
        .chars()
        .filter_map(|ch| match ch {
            'ا' | 'و' | 'ي' | ' ' => None,
            other => Some(other),
        })
        .take(ROOT_LEN)
        .collect()
}
