use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::util::ServiceExt;

use ghareeb_data::{GlossIndex, LoadMode, MeaningOverrides, PageCorpus};
use ghareeb_service::handlers::{AppState, router};
use ghareeb_service::validate;

const PAGES: &str = r#"[
  "سُورَةُ الفَاتِحَةِ\nبِسۡمِ ٱللَّهِ ٱلرَّحۡمَٰنِ ٱلرَّحِيمِ ١\nٱلۡحَمۡدُ لِلَّهِ رَبِّ ٱلۡعَٰلَمِينَ ٢ ٱلرَّحۡمَٰنِ ٱلرَّحِيمِ ٣",
  "سُورَةُ البَقَرَةِ\nبِسۡمِ ٱللَّهِ ٱلرَّحۡمَٰنِ ٱلرَّحِيمِ\nالٓمٓ ١ ذَٰلِكَ ٱلۡكِتَٰبُ لَا رَيۡبَۛ فِيهِۛ هُدٗى لِّلۡمُتَّقِينَ ٢\nٱلَّذِينَ يُؤۡمِنُونَ بِٱلۡغَيۡبِ وَيُقِيمُونَ ٱلصَّلَوٰةَ ٣",
  {"page": 3, "text": "خَتَمَ ٱللَّهُ عَلَىٰ قُلُوبِهِمۡ غِشَٰوَةٞۖ ٧\nفِي قُلُوبِهِم مَّرَضٞ ١٠"}
]"#;

const DATASET: &str = r#"{
  "pages": [
    { "page": 1, "items": [
      { "raw": "{ٱلرَّحۡمَٰنِ} : ذو الرحمة الواسعة", "surah": 1, "surah_name": "الفاتحة", "ayah": 3 }
    ] },
    { "page": 2, "items": [
      { "raw": "{رَيۡبَۛ}", "meaning": "شك", "surah": 2, "surah_name": "البقرة", "ayah": 2 },
      { "raw": "{لِّلۡمُتَّقِينَ}", "meaning": "للذين يتقون", "surah": 2, "surah_name": "البقرة", "ayah": 2 },
      { "raw": "{بِٱلۡغَيۡبِ}", "meaning": "بما غاب عن الحواس", "surah": 2, "surah_name": "البقرة", "ayah": 3 },
      { "raw": "{زُخۡرُفَ}", "meaning": "زينة", "surah": 2, "surah_name": "البقرة", "ayah": 5 }
    ] },
    { "page": 3, "items": [
      { "word": "غِشَٰوَةٞ", "meaning": "غطاء", "surah": 2, "surah_name": "البقرة", "ayah": 7 },
      { "raw": "{مَّرَضٞ}", "meaning": "شك ونفاق", "surah": 2, "surah_name": "البقرة", "ayah": 10, "page": 2 }
    ] }
  ]
}"#;

fn make_state(disable_cache: bool) -> AppState {
    let tempdir = tempfile::tempdir().unwrap();
    let dataset_path = tempdir.path().join("ghareeb.json");
    let pages_path = tempdir.path().join("pages.json");
    std::fs::write(&dataset_path, DATASET).unwrap();
    std::fs::write(&pages_path, PAGES).unwrap();

    let index = GlossIndex::load(&dataset_path, LoadMode::Owned).unwrap();
    let corpus = PageCorpus::load(&pages_path, LoadMode::Owned).unwrap();
    let mut overrides = MeaningOverrides::default();
    overrides.insert("2_2_1", "ارتياب");
    let report = validate(&index, &corpus);

    AppState {
        index: Arc::new(index),
        corpus: Arc::new(corpus),
        overrides: Some(Arc::new(overrides)),
        report: Arc::new(report),
        disable_cache,
    }
}

async fn get(state: AppState, uri: &str) -> Response {
    router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_ok() {
    let response = get(make_state(false), "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn page_glosses_are_text_driven() {
    let response = get(make_state(false), "/v1/pages/2/glosses").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
    let body = json_body(response).await;

    assert_eq!(body["page"], 2);
    let keys: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["uniqueKey"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["2_2_1", "2_2_2", "2_3_1"]);
    assert_eq!(body["entries"][0]["meaning"], "ارتياب");
    assert_eq!(body["entries"][0]["meaningSource"], "override");
    assert_eq!(body["entries"][1]["meaningSource"], "canonical");

    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["kind"], "surah_header");
    assert_eq!(lines[0]["surahName"], "البَقَرَةِ");
    assert_eq!(lines[1]["kind"], "separator");
    assert!(lines[1]["matches"].as_array().unwrap().is_empty());
    assert_eq!(lines[2]["kind"], "verse");
    assert_eq!(lines[2]["matches"].as_array().unwrap().len(), 2);

    let segments = lines[2]["segments"].as_array().unwrap();
    assert!(segments
        .iter()
        .any(|s| s["type"] == "gloss" && s["text"] == "رَيۡبَۛ" && s["uniqueKey"] == "2_2_1"));
    assert!(segments
        .iter()
        .any(|s| s["type"] == "verse_number" && s["text"] == "١"));
}

#[tokio::test]
async fn first_page_bismillah_is_verse_text() {
    let body = json_body(get(make_state(true), "/v1/pages/1/glosses").await).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["meaning"], "ذو الرحمة الواسعة");

    let lines = body["lines"].as_array().unwrap();
    assert_eq!(lines[1]["kind"], "verse");
    assert_eq!(lines[1]["matches"][0]["uniqueKey"], "1_3_1");
    // Highlighted once per page even though the word occurs again.
    assert!(lines[2]["matches"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn page_glosses_reject_bad_pages() {
    let response = get(make_state(false), "/v1/pages/0/glosses").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap_or_default().contains("page"));

    let response = get(make_state(false), "/v1/pages/9/glosses").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(make_state(false), "/v1/pages/abc/glosses").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_counts_and_limit() {
    let body = json_body(get(make_state(false), "/v1/report").await).await;
    assert_eq!(body["totalEntries"], 7);
    assert_eq!(body["matchedCount"], 6);
    assert_eq!(body["unmatchedCount"], 1);
    assert_eq!(body["coveragePercent"], 85.71);

    let mismatches = body["mismatches"].as_array().unwrap();
    assert_eq!(mismatches.len(), 2);
    assert_eq!(mismatches[0]["reason"], "not_found_in_page");
    assert_eq!(mismatches[1]["reason"], "page_number_off");
    assert_eq!(mismatches[1]["entry"]["uniqueKey"], "2_10_1");
    assert_eq!(mismatches[1]["foundInPages"], serde_json::json!([3]));
    assert_eq!(body["reasonCounts"]["page_number_off"], 1);

    let capped = json_body(get(make_state(false), "/v1/report?limit=1").await).await;
    assert_eq!(capped["mismatches"].as_array().unwrap().len(), 1);
    assert_eq!(capped["totalEntries"], 7);
}

#[tokio::test]
async fn report_csv_has_bom() {
    let response = get(make_state(true), "/v1/report.csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with('\u{FEFF}'));
    assert_eq!(csv.lines().count(), 3);
}
