use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::HashMap;

/// Errors produced while loading detector inputs.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// A database line is not a single `phrase,score` record.
    #[error("malformed database line {line}: {text:?}")]
    MalformedLine {
        /// One-based line number in the database text.
        line: usize,
        /// The offending line.
        text: String,
    },

    /// A phrase score is not a canonical non-negative decimal.
    #[error("invalid score on database line {line}: {text:?}")]
    InvalidScore {
        /// One-based line number in the database text.
        line: usize,
        /// The offending score field.
        text: String,
    },

    /// A threshold is not a canonical positive decimal.
    #[error("invalid threshold: {0:?}")]
    InvalidThreshold(String),

    /// An input file could not be read.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path of the file that failed to read.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },
}

/// Classification outcome for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The message's score reached the spam threshold.
    Spam,
    /// The message's score stayed under the spam threshold.
    NotSpam,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Spam => f.write_str("SPAM"),
            Verdict::NotSpam => f.write_str("NOT_SPAM"),
        }
    }
}

/// Scores messages against a database of weighted phrases.
///
/// The database maps lowercased phrases to damage scores. A message's score
/// is the sum over all phrases of `occurrences * damage`, where occurrences
/// counts every alignment of the phrase in the message, overlaps included.
#[derive(Debug)]
pub struct SpamDetector {
    phrases: HashMap<String, u32>,
}

impl SpamDetector {
    /// Parses a phrase database from CSV text.
    ///
    /// Each line must hold exactly one comma separating a non-empty phrase
    /// from a canonical non-negative decimal score. Phrases are lowercased;
    /// a phrase appearing on multiple lines keeps the score of its last
    /// line.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::MalformedLine`] or
    /// [`DetectorError::InvalidScore`] for the first line that breaks the
    /// format.
    pub fn from_csv(text: &str) -> Result<Self, DetectorError> {
        let mut phrases = HashMap::new();
        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let (phrase, score) =
                line.split_once(',').ok_or_else(|| DetectorError::MalformedLine {
                    line: number,
                    text: line.to_string(),
                })?;
            if phrase.is_empty() || score.is_empty() || score.contains(',') {
                return Err(DetectorError::MalformedLine {
                    line: number,
                    text: line.to_string(),
                });
            }
            let score = parse_decimal(score).ok_or_else(|| DetectorError::InvalidScore {
                line: number,
                text: score.to_string(),
            })?;
            phrases.set(phrase.to_ascii_lowercase(), score);
        }
        Ok(Self { phrases })
    }

    /// Loads a phrase database from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::Io`], carrying the path, if the file cannot
    /// be read, or the [`from_csv`] errors for malformed content.
    ///
    /// [`from_csv`]: SpamDetector::from_csv
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(&text)
    }

    /// Returns the phrase-to-score map backing the detector.
    pub fn phrases(&self) -> &HashMap<String, u32> {
        &self.phrases
    }

    /// Returns the total damage score of `message`.
    ///
    /// The message is lowercased before matching, the way the stored
    /// phrases already are, so raw and normalized text score alike.
    pub fn score(&self, message: &str) -> u64 {
        let message = message.to_ascii_lowercase();
        self.phrases
            .iter()
            .map(|(phrase, damage)| count_occurrences(&message, phrase) as u64 * u64::from(*damage))
            .sum()
    }

    /// Classifies `message`, treating any score at or above `threshold` as
    /// spam.
    pub fn classify(&self, message: &str, threshold: u32) -> Verdict {
        if self.score(message) >= u64::from(threshold) {
            Verdict::Spam
        } else {
            Verdict::NotSpam
        }
    }
}

/// Counts every occurrence of `phrase` in `message`, overlaps included.
///
/// Matching is byte-exact over every alignment. An empty phrase never
/// matches.
pub fn count_occurrences(message: &str, phrase: &str) -> usize {
    if phrase.is_empty() || phrase.len() > message.len() {
        return 0;
    }
    message
        .as_bytes()
        .windows(phrase.len())
        .filter(|window| *window == phrase.as_bytes())
        .count()
}

/// Lowercases a message line by line, joining the lines with `\n`.
///
/// Every line, including the last, is terminated; an empty input stays
/// empty.
pub fn normalize_message(text: &str) -> String {
    let mut message = String::new();
    for line in text.lines() {
        message.push_str(&line.to_ascii_lowercase());
        message.push('\n');
    }
    message
}

/// Reads a message file and normalizes it for matching.
///
/// # Errors
///
/// Returns [`DetectorError::Io`], carrying the path, if the file cannot be
/// read.
pub fn read_message_file(path: impl AsRef<Path>) -> Result<String, DetectorError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| DetectorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_message(&text))
}

/// Parses a spam threshold, which must be a canonical positive decimal.
///
/// # Errors
///
/// Returns [`DetectorError::InvalidThreshold`] for zero, signs, leading
/// zeros, or any non-digit content.
pub fn parse_threshold(text: &str) -> Result<u32, DetectorError> {
    match parse_decimal(text) {
        Some(value) if value > 0 => Ok(value),
        _ => Err(DetectorError::InvalidThreshold(text.to_string())),
    }
}

/// Accepts only the canonical decimal rendering of a `u32`.
///
/// Round-tripping through `to_string` rejects signs, leading zeros, and
/// surrounding whitespace that a plain `parse` would let through.
fn parse_decimal(text: &str) -> Option<u32> {
    let value: u32 = text.parse().ok()?;
    (value.to_string() == text).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold_accepts_canonical_positive() {
        assert_eq!(parse_threshold("1").unwrap(), 1);
        assert_eq!(parse_threshold("3").unwrap(), 3);
        assert_eq!(parse_threshold("4096").unwrap(), 4096);
    }

    #[test]
    fn test_parse_threshold_rejects_bad_input() {
        for text in ["0", "007", "+5", "-3", "", " 5", "5 ", "3.5", "12a", "abc"] {
            assert!(
                matches!(parse_threshold(text), Err(DetectorError::InvalidThreshold(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_from_csv_builds_scored_phrases() {
        let detector = SpamDetector::from_csv("Buy Now,10\nFREE,5\nlottery win,0").unwrap();

        assert_eq!(detector.phrases().len(), 3);
        assert_eq!(detector.phrases().at(&"buy now".to_string()), Ok(&10));
        assert_eq!(detector.phrases().at(&"free".to_string()), Ok(&5));
        assert_eq!(detector.phrases().at(&"lottery win".to_string()), Ok(&0));
    }

    #[test]
    fn test_from_csv_empty_text() {
        let detector = SpamDetector::from_csv("").unwrap();
        assert!(detector.phrases().is_empty());
        assert_eq!(detector.classify("anything\n", 1), Verdict::NotSpam);
    }

    #[test]
    fn test_from_csv_last_duplicate_wins() {
        let detector = SpamDetector::from_csv("spam,1\nSPAM,9").unwrap();

        assert_eq!(detector.phrases().len(), 1);
        assert_eq!(detector.phrases().at(&"spam".to_string()), Ok(&9));
    }

    #[test]
    fn test_from_csv_rejects_malformed_lines() {
        for text in ["free", "a,b,c", "free,,5", ",5", "free,", ","] {
            assert!(
                matches!(
                    SpamDetector::from_csv(text),
                    Err(DetectorError::MalformedLine { line: 1, .. })
                ),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_from_csv_reports_offending_line_number() {
        let error = SpamDetector::from_csv("ok,1\nsecond line\nmore,2").unwrap_err();
        assert!(matches!(error, DetectorError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_from_csv_rejects_noncanonical_scores() {
        for text in ["free,05", "free,-2", "free,+3", "free, 5", "free,5x"] {
            assert!(
                matches!(
                    SpamDetector::from_csv(text),
                    Err(DetectorError::InvalidScore { line: 1, .. })
                ),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_io_errors_name_the_failing_path() {
        let error = SpamDetector::from_csv_file("/nonexistent/db.csv").unwrap_err();
        assert!(matches!(error, DetectorError::Io { .. }));
        assert!(error.to_string().contains("/nonexistent/db.csv"));

        let error = read_message_file("/nonexistent/message.txt").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/message.txt"));
    }

    #[test]
    fn test_count_occurrences_counts_overlaps() {
        assert_eq!(count_occurrences("aaaa", "aa"), 3);
        assert_eq!(count_occurrences("abababa", "aba"), 3);
    }

    #[test]
    fn test_count_occurrences_includes_final_alignment() {
        assert_eq!(count_occurrences("buy now", "now"), 1);
        assert_eq!(count_occurrences("now", "now"), 1);
    }

    #[test]
    fn test_count_occurrences_degenerate_inputs() {
        assert_eq!(count_occurrences("", "a"), 0);
        assert_eq!(count_occurrences("ab", "abc"), 0);
        assert_eq!(count_occurrences("abc", ""), 0);
    }

    #[test]
    fn test_normalize_message_lowercases_and_terminates_lines() {
        assert_eq!(normalize_message("Hello\nWORLD"), "hello\nworld\n");
        assert_eq!(normalize_message("Hello\nWORLD\n"), "hello\nworld\n");
        assert_eq!(normalize_message(""), "");
    }

    #[test]
    fn test_score_sums_damage_over_phrases() {
        let detector = SpamDetector::from_csv("spam,10\nbuy,3").unwrap();
        let message = normalize_message("Spam SPAM buy");

        assert_eq!(detector.score(&message), 23);
    }

    #[test]
    fn test_score_lowercases_the_message() {
        let detector = SpamDetector::from_csv("free,5").unwrap();

        assert_eq!(detector.score("FREE free\n"), 10);
        assert_eq!(detector.classify("FREE Stuff", 5), Verdict::Spam);
    }

    #[test]
    fn test_classify_boundary_is_spam() {
        let detector = SpamDetector::from_csv("free,5").unwrap();
        let message = normalize_message("FREE stuff");

        assert_eq!(detector.classify(&message, 5), Verdict::Spam);
        assert_eq!(detector.classify(&message, 6), Verdict::NotSpam);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Spam.to_string(), "SPAM");
        assert_eq!(Verdict::NotSpam.to_string(), "NOT_SPAM");
    }

    #[test]
    fn test_detector_debug_shows_phrases() {
        let detector = SpamDetector::from_csv("free,5").unwrap();
        let output = format!("{detector:?}");

        assert!(output.contains("phrases"), "missing field in {output}");
        assert!(output.contains("\"free\": 5"), "missing entry in {output}");
    }
}
