//! Lightweight cleanup of chat answers from small local models.
//!
//! Quantized chat models tend to echo role markers, stutter words and
//! ramble past the first sentence. The grounded chat path runs its raw
//! output through [`postprocess_answer`] before returning it.

use std::sync::LazyLock;

use regex::Regex;

static ROLE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(assistant:?\.?|r[ée]ponse:?|response:|utilisateur:|user:|syst[èe]mes?:?)\s*")
        .expect("static pattern")
});

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static pattern"));

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));

static SENT_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?…]+").expect("static pattern"));

/// Full cleanup: strip role markers, collapse stutters and whitespace,
/// keep the first complete sentence.
pub fn postprocess_answer(text: &str) -> String {
    let t = strip_markers(text);
    let t = dedup_words(&t);
    let t = WS_RE.replace_all(&t, " ").trim().to_string();
    first_sentence(&t)
}

/// Remove a leading role prefix such as `assistant:` or `Réponse:`.
fn strip_markers(s: &str) -> String {
    ROLE_MARKER_RE.replace(s.trim(), "").trim().to_string()
}

/// Collapse immediate word repetitions: "droit droit droit" -> "droit".
///
/// Only whitespace-separated exact repeats (case-insensitive) collapse;
/// punctuation between occurrences keeps them.
fn dedup_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_end = 0;
    let mut prev_word: Option<String> = None;

    for m in WORD_RE.find_iter(s) {
        let gap = &s[last_end..m.start()];
        let lower = m.as_str().to_lowercase();
        let is_repeat = prev_word.as_deref() == Some(lower.as_str())
            && !gap.is_empty()
            && gap.chars().all(char::is_whitespace);
        if !is_repeat {
            out.push_str(gap);
            out.push_str(m.as_str());
        }
        prev_word = Some(lower);
        last_end = m.end();
    }
    out.push_str(&s[last_end..]);
    out
}

/// Keep the first complete sentence. A very short opener ("Oui.") pulls in
/// the following sentence too. Without any terminator, cut near 200 chars
/// at a word boundary.
fn first_sentence(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return String::new();
    }

    let mut ends = SENT_END_RE
        .find_iter(s)
        .filter(|m| {
            s[m.end()..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace)
        })
        .map(|m| m.end());

    if let Some(end) = ends.next() {
        let first = s[..end].trim();
        if first.chars().count() < 8 {
            if let Some(end2) = ends.next() {
                return s[..end2].trim().to_string();
            }
        }
        return first.to_string();
    }

    // No terminator: return up to ~200 chars, cut at the last space
    let cut: String = s.chars().take(200).collect();
    match cut.rfind(' ') {
        Some(pos) if pos > 40 => cut[..pos].trim().to_string(),
        _ => cut.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_role_marker() {
        assert_eq!(
            postprocess_answer("Assistant: Le droit est une règle."),
            "Le droit est une règle."
        );
        assert_eq!(
            postprocess_answer("Réponse: C'est la photosynthèse."),
            "C'est la photosynthèse."
        );
    }

    #[test]
    fn test_collapse_repeated_words() {
        assert_eq!(
            postprocess_answer("le droit droit droit est une règle."),
            "le droit est une règle."
        );
    }

    #[test]
    fn test_repeat_across_punctuation_kept() {
        let out = dedup_words("oui, oui");
        assert_eq!(out, "oui, oui");
    }

    #[test]
    fn test_first_sentence_only() {
        assert_eq!(
            postprocess_answer("La cellule est l'unité du vivant. Elle contient un noyau."),
            "La cellule est l'unité du vivant."
        );
    }

    #[test]
    fn test_short_opener_extends_to_second_sentence() {
        assert_eq!(
            postprocess_answer("Oui. Les mitochondries produisent l'énergie."),
            "Oui. Les mitochondries produisent l'énergie."
        );
    }

    #[test]
    fn test_no_terminator_cuts_at_word_boundary() {
        let long: String = (0..100).map(|i| format!("mot{i} ")).collect();
        let out = postprocess_answer(&long);
        assert!(out.chars().count() <= 200);
        assert!(!out.ends_with(' '));
        assert!(out.starts_with("mot0"));
        // Cut lands on a word boundary, not inside a word
        assert!(out.split(' ').all(|w| w.starts_with("mot")));
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            postprocess_answer("Une   règle\n\nde droit."),
            "Une règle de droit."
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(postprocess_answer(""), "");
        assert_eq!(postprocess_answer("   "), "");
    }

    #[test]
    fn test_ellipsis_terminator() {
        assert_eq!(
            postprocess_answer("C'est une longue histoire… et voilà la suite."),
            "C'est une longue histoire…"
        );
    }
}
