use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TranslateError;
use crate::settings::Settings;

pub const AUTO_DETECT: &str = "auto";

/// External translation capability. Implementations may fail; callers go
/// through [`TextNormalizer`], which never does.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;
}

/// Identity translator for offline runs.
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

/// Client for the public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    max_chars: usize,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, timeout: Duration, max_chars: usize) -> Result<Self, TranslateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(GoogleTranslator {
            client,
            endpoint: endpoint.to_string(),
            max_chars,
        })
    }

    fn translate_chunk(&self, chunk: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", chunk)])
            .send()?;
        if !resp.status().is_success() {
            return Err(TranslateError::Status(resp.status()));
        }
        let body: Value = resp.json()?;
        parse_response(&body)
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let mut out = Vec::new();
        for chunk in chunk_text(text, self.max_chars) {
            out.push(self.translate_chunk(&chunk, source, target)?);
        }
        Ok(out.join(" "))
    }
}

/// Response shape: `[[["translated", "original", ...], ...], ...]`.
fn parse_response(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing segment list".into()))?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(TranslateError::Malformed("empty translation".into()));
    }
    Ok(text)
}

/// Split on whitespace into pieces of at most `max_chars` characters.
/// A single word longer than the limit becomes its own piece.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current_len > 0 && current_len + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Best-effort translation of notes text into the target language.
#[derive(Clone)]
pub struct TextNormalizer {
    translator: Arc<dyn Translator>,
    target: String,
    retries: u32,
    backoff: Duration,
}

impl TextNormalizer {
    pub fn new(translator: Arc<dyn Translator>, target: &str, retries: u32, backoff: Duration) -> Self {
        TextNormalizer {
            translator,
            target: target.to_string(),
            retries,
            backoff,
        }
    }

    pub fn from_settings(settings: &Settings, translate: bool) -> anyhow::Result<Self> {
        let translator: Arc<dyn Translator> = if translate {
            Arc::new(GoogleTranslator::new(
                &settings.translate_endpoint,
                Duration::from_secs(settings.translate_timeout_secs),
                settings.translate_max_chars,
            )?)
        } else {
            Arc::new(Passthrough)
        };
        Ok(TextNormalizer::new(
            translator,
            &settings.target_language,
            settings.translate_retries,
            Duration::from_millis(settings.translate_backoff_ms),
        ))
    }

    /// Never fails: on any translation error the input comes back unchanged.
    pub fn normalize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let mut attempt = 0;
        loop {
            match self.translator.translate(text, AUTO_DETECT, &self.target) {
                Ok(translated) => return translated,
                Err(e) if attempt < self.retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    debug!("translation attempt {} failed ({}), retrying in {:?}", attempt + 1, e, delay);
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    warn!("Translation skipped ({}), keeping original text", e);
                    return text.to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing {
        calls: AtomicUsize,
    }

    impl Translator for Failing {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TranslateError::Malformed("quota exceeded".into()))
        }
    }

    /// Fails the first `fail_first` calls, then upper-cases.
    struct Flaky {
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl Translator for Flaky {
        fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
            assert_eq!(source, AUTO_DETECT);
            assert_eq!(target, "en");
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.fail_first {
                Err(TranslateError::Malformed("flaky".into()))
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    fn normalizer(t: Arc<dyn Translator>, retries: u32) -> TextNormalizer {
        TextNormalizer::new(t, "en", retries, Duration::ZERO)
    }

    #[test]
    fn failure_falls_back_to_original() {
        let t = Arc::new(Failing { calls: AtomicUsize::new(0) });
        let n = normalizer(t.clone(), 2);
        assert_eq!(n.normalize("Maschen anschlagen"), "Maschen anschlagen");
        assert_eq!(t.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_recovers() {
        let t = Arc::new(Flaky { fail_first: 1, calls: AtomicUsize::new(0) });
        let n = normalizer(t.clone(), 1);
        assert_eq!(n.normalize("hello"), "HELLO");
        assert_eq!(t.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn large_retry_count_does_not_overflow_backoff() {
        let t = Arc::new(Failing { calls: AtomicUsize::new(0) });
        let n = normalizer(t.clone(), 40);
        assert_eq!(n.normalize("Maschen"), "Maschen");
        assert_eq!(t.calls.load(Ordering::SeqCst), 41);
    }

    #[test]
    fn blank_text_skips_translator() {
        let t = Arc::new(Failing { calls: AtomicUsize::new(0) });
        let n = normalizer(t.clone(), 0);
        assert_eq!(n.normalize("   "), "   ");
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn passthrough_is_identity() {
        let n = normalizer(Arc::new(Passthrough), 0);
        assert_eq!(n.normalize("Tricoter en rond"), "Tricoter en rond");
    }

    #[test]
    fn chunks_respect_limit() {
        let chunks = chunk_text("aa bb cc dd", 5);
        assert_eq!(chunks, vec!["aa bb", "cc dd"]);
        assert_eq!(chunk_text("toolongword x", 4), vec!["toolongword", "x"]);
        assert!(chunk_text("", 10).is_empty());
    }

    #[test]
    fn response_segments_concatenate() {
        let body = serde_json::json!([[["Cast on. ", "Anschlagen. ", null], ["Knit.", "Stricken.", null]], null, "de"]);
        assert_eq!(parse_response(&body).unwrap(), "Cast on. Knit.");
        assert!(parse_response(&serde_json::json!({})).is_err());
        assert!(parse_response(&serde_json::json!([[]])).is_err());
    }
}
