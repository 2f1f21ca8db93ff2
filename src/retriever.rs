//! Lexical fallback retrieval: Jaccard word-overlap over an ad-hoc corpus.
//!
//! Used for on-the-fly question answering over a single uploaded text when
//! no persistent vector index is wanted. Nothing here touches disk.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::chain::Document;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("static pattern"));

/// Characters of corpus text substituted for an empty query.
const PSEUDO_QUERY_CHARS: usize = 300;

fn tokens(s: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(&s.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard similarity between the word sets of `query` and `passage`,
/// in `[0, 1]`. Duplicate words collapse; case is folded.
pub fn score(query: &str, passage: &str) -> f32 {
    let q = tokens(query);
    let p = tokens(passage);
    let inter = q.intersection(&p).count();
    let union = q.union(&p).count().max(1);
    inter as f32 / union as f32
}

/// Score every document against `query` and return the `k` best, stable on
/// ties (original corpus order).
///
/// An empty query is substituted with the first 300 characters of the
/// corpus text, so a blank question still surfaces representative passages
/// instead of a degenerate zero-overlap result.
pub fn retrieve(query: &str, corpus: &[Document], k: usize) -> Vec<Document> {
    if corpus.is_empty() {
        return Vec::new();
    }

    let fallback: String;
    let query: &str = if query.trim().is_empty() {
        fallback = corpus[0].text.chars().take(PSEUDO_QUERY_CHARS).collect();
        fallback.as_str()
    } else {
        query
    };

    let mut scored: Vec<(usize, f32)> = corpus
        .iter()
        .enumerate()
        .map(|(i, doc)| (i, score(query, &doc.text)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(k)
        .map(|(i, _)| corpus[i].clone())
        .collect()
}

/// Chunk one text into overlapping word windows and lexically retrieve the
/// `k` passages most relevant to `query`.
///
/// Passages are labelled `p0`, `p1`, … in source order. When `query` is
/// empty the prefix-fallback of [`retrieve`] applies.
pub fn retrieve_passages(
    text: &str,
    query: &str,
    size: usize,
    overlap: usize,
    k: usize,
) -> Vec<Document> {
    let corpus: Vec<Document> = split_words(text, size, overlap)
        .into_iter()
        .enumerate()
        .map(|(i, passage)| Document {
            text: passage,
            source: format!("p{i}"),
        })
        .collect();
    retrieve(query, &corpus, k)
}

/// Word-window chunking: windows of `size` words with step `size - overlap`
/// (clamped to 1).
fn split_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let end = (i + size).min(words.len());
        chunks.push(words[i..end].join(" "));
        i += step;
    }
    chunks
}
