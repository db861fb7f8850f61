use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use ghareeb_types::{GlossEntry, unique_key};

use crate::DataError;

/// Bracket pairs that may wrap the literal word inside `raw`.
const MARKERS: &[(char, char)] = &[
    ('{', '}'),
    ('[', ']'),
    ('\u{FD3F}', '\u{FD3E}'),
    ('\u{FD3E}', '\u{FD3F}'),
    ('«', '»'),
    ('(', ')'),
];

const MEANING_SEPARATORS: &[char] = &[':', '-', '–', '—', '،', '؛', '=', ' '];

/// Outcome counters for one dataset load.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadStats {
    pub rows: usize,
    pub kept: usize,
    pub missing_word: usize,
    pub missing_meaning: usize,
    /// Rows that are not objects or lack a usable page, surah or ayah number.
    pub malformed: usize,
}

impl LoadStats {
    pub fn dropped(&self) -> usize {
        self.missing_word + self.missing_meaning + self.malformed
    }
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    pages: Vec<Value>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default, deserialize_with = "lenient_u32")]
    page: Option<u32>,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default, deserialize_with = "lenient_string")]
    raw: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    word: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    meaning: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    surah: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    surah_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    ayah: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    page: Option<u32>,
}

/// Accept numbers, numeric strings and nulls; anything else becomes `None`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Find the first bracket-delimited word in `raw`.
///
/// Returns the trimmed inner text and whatever follows the closing bracket.
/// An unclosed or empty marker is skipped and scanning continues.
pub fn extract_marked_word(raw: &str) -> Option<(&str, &str)> {
    let mut from = 0;
    while from < raw.len() {
        let (open_pos, open, close) = raw[from..].char_indices().find_map(|(pos, ch)| {
            MARKERS
                .iter()
                .find(|(open, _)| *open == ch)
                .map(|(open, close)| (from + pos, *open, *close))
        })?;
        let inner_start = open_pos + open.len_utf8();
        match raw[inner_start..].find(close) {
            Some(rel) => {
                let inner = raw[inner_start..inner_start + rel].trim();
                let after = &raw[inner_start + rel + close.len_utf8()..];
                if !inner.is_empty() {
                    return Some((inner, after));
                }
                from = inner_start + rel + close.len_utf8();
            }
            None => from = inner_start,
        }
    }
    None
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse the nested dataset JSON into entries with per-ayah keys.
///
/// Rows are visited in file order; the `n` in `surah_ayah_n` counts the
/// entries of that ayah seen so far, starting at 1.
pub fn parse_dataset(bytes: &[u8]) -> Result<(Vec<GlossEntry>, LoadStats), DataError> {
    let dataset: RawDataset = serde_json::from_slice(bytes).map_err(|source| DataError::Json {
        what: "gloss dataset",
        source,
    })?;

    let mut stats = LoadStats::default();
    let mut counters: HashMap<(u32, u32), u32> = HashMap::new();
    let mut entries = Vec::new();

    for (position, page) in dataset.pages.into_iter().enumerate() {
        let page: RawPage = match serde_json::from_value(page) {
            Ok(page) => page,
            Err(err) => {
                debug!("page block {position}: {err}");
                stats.malformed += 1;
                continue;
            }
        };
        for item in page.items {
            stats.rows += 1;
            let row = stats.rows;
            let item: RawItem = match serde_json::from_value(item) {
                Ok(item) => item,
                Err(err) => {
                    debug!("row {row}: {err}");
                    stats.malformed += 1;
                    continue;
                }
            };

            let marked = item.raw.as_deref().and_then(extract_marked_word);
            let word = marked
                .map(|(word, _)| word)
                .or_else(|| non_blank(item.word.as_deref()));
            let Some(word) = word else {
                debug!("row {row}: no word in raw marker or word field");
                stats.missing_word += 1;
                continue;
            };

            let meaning = non_blank(item.meaning.as_deref()).or_else(|| {
                marked
                    .map(|(_, rest)| rest.trim_start_matches(MEANING_SEPARATORS).trim())
                    .filter(|s| !s.is_empty())
            });
            let Some(meaning) = meaning else {
                debug!("row {row}: no meaning for {word}");
                stats.missing_meaning += 1;
                continue;
            };

            let (Some(page_number), Some(surah), Some(ayah)) =
                (item.page.or(page.page), item.surah, item.ayah)
            else {
                debug!("row {row}: missing page, surah or ayah for {word}");
                stats.malformed += 1;
                continue;
            };

            let counter = counters.entry((surah, ayah)).or_insert(0);
            *counter += 1;

            entries.push(GlossEntry {
                page_number,
                word_text: word.to_string(),
                meaning: meaning.to_string(),
                surah_name: item.surah_name.as_deref().unwrap_or_default().trim().to_string(),
                surah_number: surah,
                verse_number: ayah,
                word_index: *counter,
                order: entries.len(),
                unique_key: unique_key(surah, ayah, *counter),
            });
        }
    }

    stats.kept = entries.len();
    if stats.dropped() > 0 {
        warn!(
            "dropped {} of {} dataset rows (missing word {}, missing meaning {}, malformed {})",
            stats.dropped(),
            stats.rows,
            stats.missing_word,
            stats.missing_meaning,
            stats.malformed
        );
    }
    info!("loaded {} gloss entries", stats.kept);
    Ok((entries, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn extracts_word_from_markers() {
        assert_eq!(extract_marked_word("{ريب}: شك"), Some(("ريب", ": شك")));
        assert_eq!(extract_marked_word("قوله ﴿ غِشَٰوَةٞ ﴾ غطاء"), Some(("غِشَٰوَةٞ", " غطاء")));
        assert_eq!(extract_marked_word("[] ثم {كلمة}"), Some(("كلمة", "")));
        assert_eq!(extract_marked_word("{غير مغلق"), None);
        assert_eq!(extract_marked_word("بدون علامات"), None);
    }

    #[test]
    fn assigns_per_ayah_keys_in_file_order() {
        let json = r#"{"pages":[
            {"page":3,"items":[
                {"raw":"{ريب}","meaning":"شك","surah":2,"surah_name":"البقرة","ayah":2},
                {"raw":"{هدى}","meaning":"رشاد","surah":2,"surah_name":"البقرة","ayah":2},
                {"raw":"{الغيب}","meaning":"ما غاب","surah":2,"surah_name":"البقرة","ayah":3}
            ]},
            {"page":4,"items":[
                {"raw":"{هدى}","meaning":"بيان","surah":"2","surah_name":"البقرة","ayah":2}
            ]}
        ]}"#;
        let (entries, stats) = parse_dataset(json.as_bytes()).unwrap();
        assert_eq!(stats.kept, 4);
        let keys: Vec<&str> = entries.iter().map(|e| e.unique_key.as_str()).collect();
        assert_eq!(keys, vec!["2_2_1", "2_2_2", "2_3_1", "2_2_3"]);
        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(entries[3].page_number, 4);
        assert_eq!(entries[3].order, 3);
        assert_eq!(entries[1].word_index, 2);
    }

    #[test]
    fn drops_incomplete_rows_silently() {
        let json = r#"{"pages":[{"page":10,"items":[
            {"raw":"لا علامة","meaning":"x","surah":2,"ayah":70},
            {"raw":"{بقرة}","surah":2,"ayah":71},
            {"raw":"{ذلول}: مذللة","surah":2,"ayah":71},
            {"word":"شية","meaning":"لون","surah":2},
            {"word":"  ","meaning":"x","surah":2,"ayah":71}
        ]}]}"#;
        let (entries, stats) = parse_dataset(json.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word_text, "ذلول");
        assert_eq!(entries[0].meaning, "مذللة");
        assert_eq!(entries[0].surah_name, "");
        assert_eq!(stats.missing_word, 2);
        assert_eq!(stats.missing_meaning, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.dropped(), 4);
    }

    #[test]
    fn rows_that_are_not_objects_are_counted_and_skipped() {
        let json = r#"{"pages":[
            "stray",
            {"page":2,"items":[
                null,
                {"raw":"{ريب}","meaning":"شك","surah":2,"ayah":2},
                "text",
                7
            ]}
        ]}"#;
        let (entries, stats) = parse_dataset(json.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].unique_key, "2_2_1");
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.malformed, 4);
        assert_eq!(stats.kept, 1);
    }

    #[test]
    fn unparsable_json_is_an_error() {
        assert!(matches!(
            parse_dataset(b"{not json"),
            Err(DataError::Json { .. })
        ));
    }
}
