use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use ghareeb_types::PAGE_COUNT;

use crate::{DataError, LoadMode, load_file};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageText {
    Text(String),
    Numbered { page: u32, text: String },
}

/// Rendered text of every Mushaf page, one newline-joined string per page.
#[derive(Clone, Debug, Default)]
pub struct PageCorpus {
    pages: Vec<String>,
}

impl PageCorpus {
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, DataError> {
        let buffer = load_file(path.as_ref(), mode)?;
        Self::from_json_slice(buffer.as_slice())
    }

    /// Parse a JSON array of page texts.
    ///
    /// Plain strings are taken in order (page 1 first); `{page, text}`
    /// objects are placed at their page number, leaving gaps empty. Numbered
    /// objects outside `1..=PAGE_COUNT` are skipped.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DataError> {
        let raw: Vec<RawPageText> =
            serde_json::from_slice(bytes).map_err(|source| DataError::Json {
                what: "page corpus",
                source,
            })?;

        let mut pages: Vec<String> = Vec::with_capacity(raw.len());
        for (idx, item) in raw.into_iter().enumerate() {
            let (slot, text) = match item {
                RawPageText::Text(text) => (idx, text),
                RawPageText::Numbered { page, .. } if page == 0 || page > PAGE_COUNT => {
                    warn!("page corpus item {idx} has page number {page}, skipped");
                    continue;
                }
                RawPageText::Numbered { page, text } => (page as usize - 1, text),
            };
            if pages.len() <= slot {
                pages.resize(slot + 1, String::new());
            }
            pages[slot] = text;
        }

        let corpus = Self::from_pages(pages)?;
        info!("loaded {} pages of text", corpus.len());
        Ok(corpus)
    }

    /// Build a corpus from page texts, page 1 first.
    pub fn from_pages(pages: Vec<String>) -> Result<Self, DataError> {
        if pages.iter().all(|p| p.trim().is_empty()) {
            return Err(DataError::EmptyCorpus);
        }
        Ok(Self { pages })
    }

    /// Text of `page` (1-based), if the corpus has it.
    pub fn page(&self, page: u32) -> Option<&str> {
        let idx = (page as usize).checked_sub(1)?;
        self.pages.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// `(page number, text)` pairs in page order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, text)| (idx as u32 + 1, text.as_str()))
    }
}
