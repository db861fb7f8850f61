use ghareeb_text::{Level, classify_line, extract_root, normalize, normalize_aligned, LineKind};

const AYAT: &[&str] = &[
    "ٱلۡحَمۡدُ لِلَّهِ رَبِّ ٱلۡعَٰلَمِينَ ٢",
    "ٱلَّذِينَ يُؤۡمِنُونَ بِٱلۡغَيۡبِ وَيُقِيمُونَ ٱلصَّلَوٰةَ وَمِمَّا رَزَقۡنَٰهُمۡ يُنفِقُونَ ﴿٣﴾",
    "خَتَمَ ٱللَّهُ عَلَىٰ قُلُوبِهِمۡ وَعَلَىٰ سَمۡعِهِمۡۖ وَعَلَىٰٓ أَبۡصَٰرِهِمۡ غِشَٰوَةٞۖ",
    "يَكَادُ ٱلۡبَرۡقُ يَخۡطَفُ أَبۡصَٰرَهُمۡۖ كُلَّمَآ أَضَآءَ لَهُم مَّشَوۡاْ فِيهِ",
    "وَإِذۡ قَالَ رَبُّكَ لِلۡمَلَٰٓئِكَةِ إِنِّي جَاعِلٞ فِي ٱلۡأَرۡضِ خَلِيفَةٗۖ",
    "ﻻ إِكۡرَاهَ فِي ٱلدِّينِۖ",
    "سُورَةُ البقرة",
    "ـــ  ۝  ١٢٣ abc",
];

#[test]
fn rahman_normalizes_and_matches_plain_text() {
    let key = normalize("ٱلرَّحۡمَـٰنِ", Level::Standard);
    assert_eq!(key, "الرحمن");
    let body = normalize("هو الرحمن الرحيم", Level::Standard);
    assert!(body.contains(&key));
}

#[test]
fn normalization_is_idempotent() {
    for level in [Level::Standard, Level::Aggressive] {
        for ayah in AYAT {
            let once = normalize(ayah, level);
            assert_eq!(normalize(&once, level), once);
        }
    }
}

#[test]
fn aggressive_is_never_longer() {
    for ayah in AYAT {
        assert!(
            normalize(ayah, Level::Aggressive).chars().count()
                <= normalize(ayah, Level::Standard).chars().count()
        );
    }
}

#[test]
fn every_normalized_char_maps_inside_the_original() {
    for level in [Level::Standard, Level::Aggressive] {
        for ayah in AYAT {
            let norm = normalize_aligned(ayah, level);
            assert_eq!(norm.text, normalize(ayah, level));
            for (pos, ch) in norm.text.char_indices() {
                let range = norm.original_range(pos, ch.len_utf8()).expect("mapped");
                assert!(range.start < range.end && range.end <= ayah.len());
                assert!(ayah.is_char_boundary(range.start) && ayah.is_char_boundary(range.end));
            }
        }
    }
}

#[test]
fn header_line_yields_surah_name() {
    assert_eq!(
        classify_line("سُورَةُ البقرة", 2),
        LineKind::SurahHeader { name: "البقرة" }
    );
}

#[test]
fn roots_never_exceed_four_chars() {
    for ayah in AYAT {
        for word in ayah.split_whitespace() {
            assert!(extract_root(word).chars().count() <= 4);
        }
    }
}
