//! Extracts raw text from a PDF file for ingestion elsewhere.
//!
//! Usage: extract-pdf <file.pdf> [more.pdf ...]
//! Page texts are concatenated with newlines and written to stdout.

use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use lopdf::Document;

fn main() -> anyhow::Result<()> {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: extract-pdf <file.pdf> [more.pdf ...]");
    }

    for path in &paths {
        let text = extract_text(Path::new(path))
            .with_context(|| format!("failed to extract text from {}", path))?;
        print!("{}", text);
    }

    Ok(())
}

fn extract_text(path: &Path) -> anyhow::Result<String> {
    let doc = Document::load(path).context("failed to load PDF")?;

    let mut text = String::new();
    for (page_num, _page_id) in doc.get_pages() {
        let content = doc
            .extract_text(&[page_num])
            .with_context(|| format!("failed to extract text from page {}", page_num))?;
        text.push_str(&content);
        text.push('\n');
    }

    Ok(text)
}
