use std::collections::HashSet;

use ghareeb_data::GlossIndex;
use ghareeb_types::{GlossEntry, NEIGHBOR_RADIUS};

use crate::matcher::{LineMatches, match_page, prepare_candidates};

/// Everything a renderer needs for one Mushaf page.
#[derive(Clone, Debug)]
pub struct PageGlosses<'t, 'e> {
    pub page: u32,
    /// Matched entries, each once, in order of first appearance.
    pub entries: Vec<&'e GlossEntry>,
    pub lines: Vec<LineMatches<'t, 'e>>,
}

/// Align glosses recorded on `page` or within two pages of it against the
/// page text.
///
/// Entries whose phrase does not appear on the page are omitted.
pub fn glosses_for_page<'t, 'e>(index: &'e GlossIndex, page: u32, text: &'t str) -> PageGlosses<'t, 'e> {
    let candidates = prepare_candidates(index.candidates_near(page, NEIGHBOR_RADIUS));
    let lines = match_page(page, text, &candidates);

    let mut hits: Vec<(usize, &'e GlossEntry)> = lines
        .iter()
        .flat_map(|line| line.matches.iter().map(move |m| (line.offset + m.start, m.entry)))
        .collect();
    hits.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    let entries = hits
        .into_iter()
        .filter(|(_, entry)| seen.insert(entry.unique_key.as_str()))
        .map(|(_, entry)| entry)
        .collect();

    PageGlosses { page, entries, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghareeb_types::unique_key;

    fn entry(word: &str, page: u32, ayah: u32) -> GlossEntry {
        GlossEntry {
            page_number: page,
            word_text: word.into(),
            meaning: "معنى".into(),
            surah_name: "البقرة".into(),
            surah_number: 2,
            verse_number: ayah,
            word_index: 1,
            order: ayah as usize,
            unique_key: unique_key(2, ayah, 1),
        }
    }

    #[test]
    fn neighbour_entries_are_found_and_ordered_by_position() {
        let index = GlossIndex::from_entries(vec![
            entry("هدى", 5, 1),
            entry("ريب", 3, 2),
            entry("غشوة", 9, 3),
            entry("مرض", 4, 4),
        ]);
        let text = "لَا رَيۡبَۛ فِيهِۛ هُدٗى\nفِي قُلُوبِهِم مَّرَضٞ";
        let glosses = glosses_for_page(&index, 4, text);

        let keys: Vec<&str> = glosses.entries.iter().map(|e| e.unique_key.as_str()).collect();
        assert_eq!(keys, vec!["2_2_1", "2_1_1", "2_4_1"]);
        assert_eq!(glosses.lines.len(), 2);
        assert_eq!(glosses.lines[1].matches.len(), 1);
    }

    #[test]
    fn far_pages_are_not_candidates() {
        let index = GlossIndex::from_entries(vec![entry("ريب", 10, 1)]);
        let glosses = glosses_for_page(&index, 2, "لا ريب فيه");
        assert!(glosses.entries.is_empty());
    }
}
