//! Per-record text cleanup applied before the corpus is serialized.
//!
//! Posts in the source corpus often tag the author's age and gender inline,
//! e.g. `(15f)` or `(20m)`. Those markers are stripped, titles get terminal
//! punctuation, and title and body are joined into one training string.

use crate::corpus::Record;
use once_cell::sync::Lazy;
use regex::Regex;

static AGE_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([0-9]+[A-Za-z]\)").expect("age annotation pattern is valid"));

const TERMINAL_PUNCTUATION: [char; 3] = ['.', '?', '!'];

/// Remove every `(<digits><letter>)` marker and trim the surrounding whitespace.
///
/// Removal repeats until no marker is left, since stripping an inner marker
/// such as `((15f)15f)` can close up a new one around it.
#[must_use]
pub fn strip_age_annotations(text: &str) -> String {
    let mut cleaned = text.to_string();
    while AGE_ANNOTATION.is_match(&cleaned) {
        cleaned = AGE_ANNOTATION.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

#[must_use]
pub fn has_age_annotation(text: &str) -> bool {
    AGE_ANNOTATION.is_match(text)
}

/// Append `.` to a non-empty title that does not already end a sentence.
#[must_use]
pub fn punctuate_title(title: &str) -> String {
    match title.chars().last() {
        Some(last) if !TERMINAL_PUNCTUATION.contains(&last) => format!("{title}."),
        _ => title.to_string(),
    }
}

/// Build the training string for one record: `"<title> <body>"`.
///
/// An empty title still yields the separating space, and an empty body is
/// passed through unchanged.
#[must_use]
pub fn normalize(record: &Record) -> String {
    let title = punctuate_title(&strip_age_annotations(&record.title));
    let body = strip_age_annotations(&record.body);
    format!("{title} {body}")
}

/// Normalize a whole table, keeping row order.
#[must_use]
pub fn normalize_all(records: &[Record]) -> Vec<String> {
    let examples: Vec<String> = records.iter().map(normalize).collect();

    let empty_bodies = records.iter().filter(|r| strip_age_annotations(&r.body).is_empty()).count();
    if empty_bodies > 0 {
        tracing::warn!(empty_bodies, "records with an empty body kept as-is");
    }
    let annotated = records.iter().filter(|r| has_age_annotation(&r.title) || has_age_annotation(&r.body)).count();
    if annotated > 0 {
        tracing::debug!(annotated, "stripped age annotations");
    }
    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, body: &str) -> Record {
        Record::new("t3_test", title, body)
    }

    #[test]
    fn test_end_to_end_example() {
        let r = record("I feel awful ", "(20m) nothing feels right");
        assert_eq!(normalize(&r), "I feel awful. nothing feels right");
    }

    #[test]
    fn test_strips_every_annotation_from_both_fields() {
        let r = record("Me (15f) and him (17M)", "I (15f) told him (17m) everything");
        let out = normalize(&r);
        assert!(!has_age_annotation(&out));
        assert_eq!(out, "Me  and him. I  told him  everything");
    }

    #[test]
    fn test_nested_annotation_fully_removed() {
        let out = normalize(&record("Title", "me ((15f)15f) here"));
        assert_eq!(out, "Title. me  here");
        assert!(!has_age_annotation(&out));
        assert_eq!(strip_age_annotations("((3c)4d)"), "");
        assert_eq!(strip_age_annotations("(((1a)2b)3c) left"), "left");
    }

    #[test]
    fn test_no_annotation_survives_adversarial_inputs() {
        let inputs = [
            "(1a)(2b)",
            "((3c)4d)",
            "x(12F)(34m)y",
            "(5(6z)Q)",
            "((7e)(8f)9g)",
            "((((10a)11B)12c)13D)",
            "(14x)) ((15Y)",
            "tail (99z",
        ];
        for input in inputs {
            let out = normalize(&record(input, input));
            assert!(!has_age_annotation(&out), "annotation left in {out:?} from {input:?}");
            assert_eq!(strip_age_annotations(&strip_age_annotations(input)), strip_age_annotations(input));
        }
    }

    #[test]
    fn test_leaves_non_matching_parentheses() {
        assert_eq!(strip_age_annotations("(ok) (15) (f) (15ff) (a1)"), "(ok) (15) (f) (15ff) (a1)");
    }

    #[test]
    fn test_existing_terminal_punctuation_kept() {
        for title in ["Why me?", "Help!", "Done."] {
            assert_eq!(punctuate_title(title), title);
        }
    }

    #[test]
    fn test_title_gains_exactly_one_period() {
        let out = normalize(&record("Another bad day", "body"));
        assert_eq!(out, "Another bad day. body");
        assert!(!out.contains(".."));
    }

    #[test]
    fn test_empty_title_keeps_leading_space() {
        assert_eq!(normalize(&record("", "just the body")), " just the body");
        assert_eq!(normalize(&record("(22f)", "body")), " body");
    }

    #[test]
    fn test_empty_body_passes_through() {
        assert_eq!(normalize(&record("Title", "(19m)")), "Title. ");
    }

    #[test]
    fn test_renormalizing_is_noop() {
        let first = record("I feel awful", "(20m) nothing feels right");
        let once = normalize(&first);

        let cleaned = record(
            &punctuate_title(&strip_age_annotations(&first.title)),
            &strip_age_annotations(&first.body),
        );
        assert_eq!(normalize(&cleaned), once);
    }

    #[test]
    fn test_normalize_all_keeps_order() {
        let records = vec![record("a", "1"), record("b", "2"), record("c", "3")];
        assert_eq!(normalize_all(&records), vec!["a. 1", "b. 2", "c. 3"]);
    }
}
