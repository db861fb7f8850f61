use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use ghareeb_data::{GlossIndex, MeaningOverrides, PageCorpus};
use ghareeb_text::LineKind;
use ghareeb_types::{MatchingReport, MeaningSource, resolve_meaning};

use crate::lookup::glosses_for_page;
use crate::matcher::{LineMatches, Segment, segment_line};
use crate::report::{to_csv, to_json};

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<GlossIndex>,
    pub corpus: Arc<PageCorpus>,
    pub overrides: Option<Arc<MeaningOverrides>>,
    /// Computed once at startup.
    pub report: Arc<MatchingReport>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossView {
    unique_key: String,
    word_text: String,
    surah_name: String,
    surah_number: u32,
    verse_number: u32,
    page_number: u32,
    meaning: String,
    meaning_source: MeaningSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanView {
    start: usize,
    end: usize,
    unique_key: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentView {
    Plain {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Gloss {
        text: String,
        unique_key: String,
    },
    VerseNumber {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    SurahHeader,
    Separator,
    Verse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    index: usize,
    kind: LineRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    surah_name: Option<String>,
    text: String,
    matches: Vec<SpanView>,
    segments: Vec<SegmentView>,
}

#[derive(Serialize)]
pub struct PageGlossesResponse {
    page: u32,
    entries: Vec<GlossView>,
    lines: Vec<LineView>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/pages/{page}/glosses", get(page_glosses))
        .route("/v1/report", get(report_json))
        .route("/v1/report.csv", get(report_csv))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn page_glosses(
    State(state): State<AppState>,
    Path(page): Path<u32>,
) -> Result<Response, ApiError> {
    if page == 0 {
        return Err(ApiError::bad_request("page must be >= 1"));
    }
    let text = state
        .corpus
        .page(page)
        .ok_or_else(|| ApiError::NotFound(format!("page {page} is not in the corpus")))?;

    let glosses = glosses_for_page(&state.index, page, text);
    let overrides = state.overrides.as_deref();
    let entries = glosses
        .entries
        .iter()
        .map(|entry| {
            let meaning = resolve_meaning(entry, overrides);
            GlossView {
                unique_key: entry.unique_key.clone(),
                word_text: entry.word_text.clone(),
                surah_name: entry.surah_name.clone(),
                surah_number: entry.surah_number,
                verse_number: entry.verse_number,
                page_number: entry.page_number,
                meaning: meaning.text.to_string(),
                meaning_source: meaning.source,
            }
        })
        .collect();
    let lines = glosses.lines.iter().map(line_view).collect();

    let response = PageGlossesResponse {
        page,
        entries,
        lines,
    };
    Ok(with_cache(&state, "public, max-age=300", Json(response)))
}

fn line_view(line: &LineMatches<'_, '_>) -> LineView {
    let (kind, surah_name) = match line.kind {
        LineKind::SurahHeader { name } => (LineRole::SurahHeader, Some(name.to_string())),
        LineKind::Separator => (LineRole::Separator, None),
        LineKind::Verse => (LineRole::Verse, None),
    };
    let matches = line
        .matches
        .iter()
        .map(|m| SpanView {
            start: m.start,
            end: m.end,
            unique_key: m.entry.unique_key.clone(),
        })
        .collect();
    let segments = segment_line(line.text, &line.matches)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) => SegmentView::Plain { text: text.into() },
            Segment::Gloss { text, entry } => SegmentView::Gloss {
                text: text.into(),
                unique_key: entry.unique_key.clone(),
            },
            Segment::VerseNumber(text) => SegmentView::VerseNumber { text: text.into() },
        })
        .collect();
    LineView {
        index: line.index,
        kind,
        surah_name,
        text: line.text.to_string(),
        matches,
        segments,
    }
}

async fn report_json(
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let json = match params.limit {
        Some(limit) => to_json(&state.report.capped(limit)),
        None => to_json(&state.report),
    }
    .map_err(|err| {
        error!("failed to serialize report: {err}");
        ApiError::Internal
    })?;
    let body = (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        json,
    );
    Ok(with_cache(&state, "public, max-age=60", body))
}

async fn report_csv(State(state): State<AppState>) -> Response {
    let csv = to_csv(&state.report);
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/csv; charset=utf-8"),
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"ghareeb-report.csv\""),
        ),
    ];
    with_cache(&state, "public, max-age=60", (headers, csv))
}

fn with_cache(state: &AppState, policy: &'static str, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(policy))],
        body,
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotFound(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
