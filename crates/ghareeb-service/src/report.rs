use ghareeb_types::{MatchingReport, MismatchEntry};

/// Byte-order mark so spreadsheet tools detect UTF-8 Arabic text.
pub const CSV_BOM: &str = "\u{FEFF}";

/// Word, surah, ayah, page, reason, detail, pages the word was found on.
pub const CSV_HEADER: [&str; 7] = [
    "الكلمة",
    "السورة",
    "الآية",
    "الصفحة",
    "السبب",
    "التفاصيل",
    "الصفحات الموجودة فيها",
];

/// Pretty-printed JSON of the whole report.
pub fn to_json(report: &MatchingReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// BOM-prefixed CSV of the mismatch list, one row per mismatch.
///
/// Every field is quoted, with embedded quotes doubled.
pub fn to_csv(report: &MatchingReport) -> String {
    let mut out = String::from(CSV_BOM);
    push_row(&mut out, CSV_HEADER.iter().copied());
    for mismatch in &report.mismatches {
        let fields = csv_fields(mismatch);
        push_row(&mut out, fields.iter().map(String::as_str));
    }
    out
}

fn csv_fields(mismatch: &MismatchEntry) -> [String; 7] {
    let entry = &mismatch.entry;
    let surah = if entry.surah_name.trim().is_empty() {
        entry.surah_number.to_string()
    } else {
        entry.surah_name.clone()
    };
    let found = mismatch
        .found_in_pages
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    [
        entry.word_text.clone(),
        surah,
        entry.verse_number.to_string(),
        entry.page_number.to_string(),
        mismatch.reason.as_str().to_string(),
        mismatch.detail.clone(),
        found,
    ]
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let row = fields.map(quote_csv_field).collect::<Vec<_>>().join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

fn quote_csv_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ghareeb_types::{GlossEntry, MismatchReason, unique_key};

    fn mismatch(word: &str, reason: MismatchReason, found: Option<Vec<u32>>) -> MismatchEntry {
        MismatchEntry {
            entry: GlossEntry {
                page_number: 583,
                word_text: word.into(),
                meaning: "معنى".into(),
                surah_name: "ق".into(),
                surah_number: 50,
                verse_number: 19,
                word_index: 1,
                order: 0,
                unique_key: unique_key(50, 19, 1),
            },
            reason,
            detail: "found \"nearby\", maybe".into(),
            found_in_pages: found,
        }
    }

    fn report() -> MatchingReport {
        MatchingReport {
            total_entries: 10,
            matched_count: 8,
            unmatched_count: 2,
            mismatches: vec![
                mismatch("سكرة", MismatchReason::PageNumberOff, Some(vec![582, 584])),
                mismatch("مرض", MismatchReason::DuplicateMatch, None),
                mismatch("زخرف", MismatchReason::NotFoundInPage, None),
            ],
            coverage_percent: 80.0,
            generated_at: Utc::now(),
            reason_counts: Default::default(),
            matched_by: Default::default(),
            low_confidence: Vec::new(),
        }
    }

    #[test]
    fn csv_starts_with_bom_and_arabic_header() {
        let csv = to_csv(&report());
        assert!(csv.starts_with('\u{FEFF}'));

        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').split("\r\n").collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "");
        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 7);
        assert_eq!(header[0], "\"الكلمة\"");
        assert!(lines[1].starts_with("\"سكرة\",\"ق\",\"19\",\"583\",\"page_number_off\""));
        assert!(lines[1].ends_with(",\"582 584\""));
    }

    #[test]
    fn csv_doubles_embedded_quotes() {
        let csv = to_csv(&report());
        assert!(csv.contains("\"found \"\"nearby\"\", maybe\""));
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json = to_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["coveragePercent"], 80.0);
        assert_eq!(value["mismatches"][0]["reason"], "page_number_off");
        assert_eq!(value["mismatches"][0]["foundInPages"][1], 584);
        assert!(json.contains('\n'));
    }
}
