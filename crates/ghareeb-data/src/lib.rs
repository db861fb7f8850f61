//! Load the gloss dataset and the Mushaf page corpus.
//!
//! The dataset is externally curated, so loading is tolerant: rows without a
//! word or a meaning are dropped and counted in [`LoadStats`], never raised.
//! The only hard failures are an unreadable or unparsable file and an empty
//! page corpus, reported as [`DataError`].
//!
//! # Features
//! - Bracket-scan extraction of the literal word from the `raw` field.
//! - Per-ayah counters producing collision-free `surah_ayah_n` keys.
//! - A page → entries index with neighbour gathering, since the recorded
//!   page of an entry can drift by one or two pages.
//! - Runtime backing choice: memory-mapped or owned buffers via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use ghareeb_data::{GlossIndex, LoadMode, PageCorpus};
//!
//! # fn main() -> Result<(), ghareeb_data::DataError> {
//! let index = GlossIndex::load("data/ghareeb.json", LoadMode::Mmap)?;
//! let corpus = PageCorpus::load("data/pages.json", LoadMode::Mmap)?;
//! for entry in index.candidates_near(583, 2) {
//!     println!("{} {}", entry.unique_key, entry.word_text);
//! }
//! println!("{} pages", corpus.len());
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p ghareeb-data --example stats -- <dataset> <pages>`.

mod corpus;
mod dataset;
mod overrides;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use thiserror::Error;

use ghareeb_types::GlossEntry;

pub use corpus::PageCorpus;
pub use dataset::{LoadStats, extract_marked_word, parse_dataset};
pub use overrides::MeaningOverrides;

/// Strategy for loading data files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy parse).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("page corpus contains no pages")]
    EmptyCorpus,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer, DataError> {
    let io_err = |source| DataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    match mode {
        // Mapping an empty file fails on some platforms.
        LoadMode::Mmap if file.metadata().map_err(io_err)?.len() > 0 => {
            unsafe { Mmap::map(&file) }.map(Buffer::Mmap).map_err(io_err)
        }
        _ => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).map_err(io_err)?;
            Ok(Buffer::Owned(buf))
        }
    }
}

/// Page → entries index over the whole gloss dataset.
#[derive(Clone, Debug, Default)]
pub struct GlossIndex {
    pages: BTreeMap<u32, Vec<GlossEntry>>,
    len: usize,
    stats: LoadStats,
}

impl GlossIndex {
    /// Load and index the dataset file at `path`.
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, DataError> {
        let buffer = load_file(path.as_ref(), mode)?;
        Self::from_json_slice(buffer.as_slice())
    }

    /// Parse and index a dataset held in memory.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DataError> {
        let (entries, stats) = parse_dataset(bytes)?;
        let mut index = Self::from_entries(entries);
        index.stats = stats;
        Ok(index)
    }

    /// Index already-built entries, keeping their relative order per page.
    pub fn from_entries(entries: impl IntoIterator<Item = GlossEntry>) -> Self {
        let mut pages: BTreeMap<u32, Vec<GlossEntry>> = BTreeMap::new();
        let mut len = 0usize;
        for entry in entries {
            len += 1;
            pages.entry(entry.page_number).or_default().push(entry);
        }
        for list in pages.values_mut() {
            list.sort_by_key(|e| e.order);
        }
        Self {
            pages,
            len,
            stats: LoadStats {
                rows: len,
                kept: len,
                ..LoadStats::default()
            },
        }
    }

    /// Entries recorded on `page`, in dataset order.
    pub fn entries_for_page(&self, page: u32) -> &[GlossEntry] {
        static EMPTY: [GlossEntry; 0] = [];
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&EMPTY)
    }

    /// Candidates for `page`: its own entries first, then those recorded
    /// on pages `page ± 1`, `page ± 2`, … up to `radius`.
    pub fn candidates_near(&self, page: u32, radius: u32) -> Vec<&GlossEntry> {
        let mut out: Vec<&GlossEntry> = self.entries_for_page(page).iter().collect();
        for distance in 1..=radius {
            if let Some(before) = page.checked_sub(distance) {
                out.extend(self.entries_for_page(before).iter());
            }
            if let Some(after) = page.checked_add(distance) {
                out.extend(self.entries_for_page(after).iter());
            }
        }
        out
    }

    /// Pages that have at least one entry, with their entries.
    pub fn pages(&self) -> impl Iterator<Item = (u32, &[GlossEntry])> + '_ {
        self.pages.iter().map(|(page, list)| (*page, list.as_slice()))
    }

    /// All entries, ordered by recorded page then dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &GlossEntry> + '_ {
        self.pages.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct recorded pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }
}
