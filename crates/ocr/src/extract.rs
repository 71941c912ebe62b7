use std::cell::OnceCell;
use std::sync::OnceLock;

use regex::Regex;

use ktp_core::{Field, KtpDocument};

use crate::rules::{FieldRule, Matcher, RULES};

fn re_whitespace() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"))
}

/// Read-only views over the recognized text.
///
/// Labeled patterns run on the verbatim text (they are case-insensitive on
/// their own). The lower-cased, whitespace-collapsed view is only needed by
/// keyword fallbacks, so it is built lazily and at most once.
struct TextView<'a> {
    verbatim: &'a str,
    normalized: OnceCell<String>,
}

impl<'a> TextView<'a> {
    fn new(verbatim: &'a str) -> Self {
        Self { verbatim, normalized: OnceCell::new() }
    }

    fn normalized(&self) -> &str {
        self.normalized
            .get_or_init(|| re_whitespace().replace_all(&self.verbatim.to_lowercase(), " ").into_owned())
    }
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract structured KTP fields from raw OCR text.
    ///
    /// Never fails: anything that does not match is left as `None`.
    pub fn extract(ocr_text: &str) -> KtpDocument {
        let view = TextView::new(ocr_text);
        let mut doc = KtpDocument::default();
        for rule in RULES {
            for (field, value) in Self::apply_view(rule, &view) {
                doc.set(field, value);
            }
        }
        doc
    }

    /// Evaluate one rule against `ocr_text`, returning the fields it sets.
    pub fn apply(rule: &FieldRule, ocr_text: &str) -> Vec<(Field, String)> {
        Self::apply_view(rule, &TextView::new(ocr_text))
    }

    fn apply_view(rule: &FieldRule, view: &TextView<'_>) -> Vec<(Field, String)> {
        for (idx, matcher) in rule.matchers.iter().enumerate() {
            if let Some(values) = Self::try_matcher(rule, matcher, view) {
                tracing::debug!(rule = rule.name, matcher = idx, "field matched");
                return values;
            }
        }
        Vec::new()
    }

    fn try_matcher(
        rule: &FieldRule,
        matcher: &Matcher,
        view: &TextView<'_>,
    ) -> Option<Vec<(Field, String)>> {
        match matcher {
            Matcher::LabeledCapture { pattern, groups } => {
                let caps = pattern().captures(view.verbatim)?;
                // Every mapped group must take part; blank ones stay absent.
                let mut values = Vec::with_capacity(groups.len());
                for (idx, field) in groups.iter() {
                    let value = rule.normalize.apply(caps.get(*idx)?.as_str());
                    if !value.is_empty() {
                        values.push((*field, value));
                    }
                }
                (!values.is_empty()).then_some(values)
            }
            Matcher::KeywordPresence { keywords, field, value } => {
                let normalized = view.normalized();
                keywords
                    .iter()
                    .any(|k| normalized.contains(k))
                    .then(|| vec![(*field, value.to_string())])
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
