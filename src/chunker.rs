//! Overlap-aware chunking of course text into character windows.
//!
//! Chunks are the unit indexed for retrieval: a window of `size` characters
//! slides over the text with step `size - overlap`, so consecutive chunks
//! share `overlap` characters of context.

/// A contiguous slice of a larger document.
///
/// `offset` is the starting character index in the source text, kept for
/// provenance when the chunk is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub offset: usize,
}

/// Splits `text` into overlapping chunks of `size` characters.
///
/// The window step is `size - overlap`, clamped to a minimum of 1 so a
/// degenerate `overlap >= size` cannot stall the scan. Windows that trim to
/// nothing (whitespace-only) are dropped. Text shorter than `size` yields a
/// single chunk covering the whole text; empty text yields no chunks.
pub fn split(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    if size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();

    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            chunks.push(Chunk {
                text: window,
                offset: start,
            });
        }
        start += step;
    }

    chunks
}
