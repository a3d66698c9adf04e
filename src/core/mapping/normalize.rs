//! Transcript and field-name normalization

use crate::domain::{NextMedError, Result};
use regex::Regex;

/// Spoken filler words and phrases removed before pattern matching
pub const FILLER_WORDS: &[&str] = &[
    "you know",
    "um",
    "uh",
    "er",
    "ah",
    "like",
    "basically",
    "actually",
    "so",
    "well",
];

/// Contractions rewritten to their long form
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("i'm", "i am"),
    ("i've", "i have"),
    ("she's", "she is"),
    ("he's", "he is"),
    ("it's", "it is"),
    ("don't", "do not"),
    ("can't", "cannot"),
    ("won't", "will not"),
];

/// Punctuation kept attached to words (dates, ranges, decimals)
const KEPT_PUNCTUATION: &[char] = &['.', ',', '/', '-'];

/// Lowercase, trim and collapse internal whitespace of a field name
///
/// ```
/// use nextmed::core::mapping::normalize::normalize_field_name;
///
/// assert_eq!(normalize_field_name("  Patient   Age "), "patient age");
/// ```
pub fn normalize_field_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Transcript normalizer for pattern matching
pub struct TranscriptNormalizer {
    contractions: Vec<(Regex, &'static str)>,
    fillers: Regex,
}

impl TranscriptNormalizer {
    /// Compile the normalization rules
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in rule fails to compile.
    pub fn new() -> Result<Self> {
        let contractions = CONTRACTIONS
            .iter()
            .map(|(short, long)| {
                let pattern = format!(r"\b{}\b", regex::escape(short));
                Regex::new(&pattern)
                    .map(|re| (re, *long))
                    .map_err(|e| {
                        NextMedError::Configuration(format!("Invalid contraction rule: {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let alternatives = FILLER_WORDS
            .iter()
            .map(|w| regex::escape(w).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let fillers = Regex::new(&format!(r"\b(?:{alternatives})\b,?"))
            .map_err(|e| NextMedError::Configuration(format!("Invalid filler rule: {e}")))?;

        Ok(Self {
            contractions,
            fillers,
        })
    }

    /// Normalize a transcript
    ///
    /// Steps, in order: lowercase; canonical apostrophes; contraction
    /// expansion; punctuation other than `. , / -` spaced out; filler
    /// removal; whitespace collapse.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");

        for (re, long) in &self.contractions {
            out = re.replace_all(&out, *long).into_owned();
        }

        let mut spaced = String::with_capacity(out.len() + 16);
        for c in out.chars() {
            if c.is_ascii_punctuation() && !KEPT_PUNCTUATION.contains(&c) {
                spaced.push(' ');
                spaced.push(c);
                spaced.push(' ');
            } else {
                spaced.push(c);
            }
        }

        let without_fillers = self.fillers.replace_all(&spaced, " ");

        without_fillers.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
