//! Response-language resolution: explicit request, then detection, then fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Used when detection fails.
pub const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("no features in text")]
    NoFeatures,
    #[error("detector failed: {0}")]
    Failed(String),
}

pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code of the dominant language of `text`.
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSource {
    Explicit,
    Detected,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLanguage {
    pub code: String,
    pub source: LanguageSource,
}

pub fn resolve_language(
    text: &str,
    requested: Option<&str>,
    detector: &dyn LanguageDetector,
) -> ResolvedLanguage {
    let detected = match detector.detect(text) {
        Ok(code) => ResolvedLanguage {
            code,
            source: LanguageSource::Detected,
        },
        Err(e) => {
            tracing::debug!("Language detection failed ({}), using {}", e, FALLBACK_LANGUAGE);
            ResolvedLanguage {
                code: FALLBACK_LANGUAGE.to_string(),
                source: LanguageSource::Fallback,
            }
        }
    };

    match requested.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => ResolvedLanguage {
            code: code.to_string(),
            source: LanguageSource::Explicit,
        },
        None => detected,
    }
}

static SCRIPTS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("ml", r"\p{Malayalam}"),
        ("ta", r"\p{Tamil}"),
        ("kn", r"\p{Kannada}"),
        ("te", r"\p{Telugu}"),
        ("hi", r"\p{Devanagari}"),
        ("bn", r"\p{Bengali}"),
        ("gu", r"\p{Gujarati}"),
        ("pa", r"\p{Gurmukhi}"),
        ("or", r"\p{Oriya}"),
        ("ar", r"\p{Arabic}"),
        ("ja", r"[\p{Hiragana}\p{Katakana}]"),
        ("zh", r"\p{Han}"),
        ("ko", r"\p{Hangul}"),
        ("ru", r"\p{Cyrillic}"),
        ("el", r"\p{Greek}"),
        ("th", r"\p{Thai}"),
        ("en", r"\p{Latin}"),
    ]
    .into_iter()
    .map(|(code, pattern)| (code, Regex::new(pattern).unwrap()))
    .collect()
});

/// Picks the language whose script covers the most characters.
///
/// Latin text is reported as English; telling Latin-script languages apart
/// needs n-gram statistics this detector does not carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptDetector;

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        let counts: Vec<(&str, usize)> = SCRIPTS
            .iter()
            .map(|(code, re)| (*code, re.find_iter(text).count()))
            .collect();

        let kana = counts.iter().find(|(c, _)| *c == "ja").map_or(0, |(_, n)| *n);

        counts
            .into_iter()
            // Kanji inside kana text is Japanese, not Chinese.
            .map(|(code, n)| if code == "zh" && kana > 0 { ("ja", n + kana) } else { (code, n) })
            .filter(|(_, n)| *n > 0)
            .max_by_key(|(_, n)| *n)
            .map(|(code, _)| code.to_string())
            .ok_or(DetectionError::NoFeatures)
    }
}
