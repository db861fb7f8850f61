use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ghareeb_data::{GlossIndex, LoadMode, PageCorpus};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let usage = "usage: cargo run -p ghareeb-data --example stats -- <dataset.json> <pages.json>";
    let dataset = args.next().map(PathBuf::from).context(usage)?;
    let pages = args.next().map(PathBuf::from).context(usage)?;

    let index = GlossIndex::load(&dataset, LoadMode::Mmap)
        .with_context(|| format!("loading dataset from {}", dataset.display()))?;
    let corpus = PageCorpus::load(&pages, LoadMode::Mmap)
        .with_context(|| format!("loading pages from {}", pages.display()))?;

    let stats = index.stats();
    println!("Dataset: {}", dataset.display());
    println!("Rows          : {}", stats.rows);
    println!("Entries kept  : {}", stats.kept);
    println!("Missing word  : {}", stats.missing_word);
    println!("Missing meaning: {}", stats.missing_meaning);
    println!("Malformed     : {}", stats.malformed);
    println!("Pages with entries: {}", index.page_count());
    println!("Corpus pages  : {}", corpus.len());

    let busiest = index
        .pages()
        .max_by_key(|(_, entries)| entries.len())
        .map(|(page, entries)| (page, entries.len()));
    if let Some((page, count)) = busiest {
        println!("Busiest page  : {page} ({count} entries)");
    }

    let outside: usize = index
        .pages()
        .filter(|(page, _)| corpus.page(*page).is_none())
        .map(|(_, entries)| entries.len())
        .sum();
    println!("Entries recorded on pages missing from the corpus: {outside}");

    Ok(())
}
