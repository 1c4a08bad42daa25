//! Emotion classification
//!
//! A probabilistic model backend is tried first; when it is disabled,
//! unreachable, or errors out, a deterministic keyword matcher answers instead.
//! Both paths sit behind [`ClassifierFacade`], which never fails.

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::emotion::{AliasTable, ClassificationResult, ClassifierSource, EmotionLabel};
use crate::error::{EngineError, Result};
use crate::profile::EmotionProfile;

const WORD_PATTERN: &str = r"\w[\w'-]*";

/// Settings for the primary (model) backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// Text-classification endpoint speaking the Hugging Face inference format.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding a bearer token, if any.
    pub api_token_env: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_token_env: Some("HF_API_TOKEN".to_string()),
            timeout_ms: 5000,
        }
    }
}

impl ClassifierConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// One entry of a backend's probability distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A probabilistic classifier returning a distribution over its native labels.
///
/// Implementations are shared across request threads and must tolerate
/// concurrent calls.
pub trait EmotionBackend: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    fn predict(&self, text: &str) -> Result<Vec<LabelScore>>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Flat(scores) => scores,
        }
    }
}

/// Remote text-classification backend, e.g. a hosted
/// `j-hartmann/emotion-english-distilroberta-base`.
pub struct HttpBackend {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                EngineError::Configuration("classifier endpoint is not set".to_string())
            })?;
        let token = config
            .api_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty());

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

impl EmotionBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn predict(&self, text: &str) -> Result<Vec<LabelScore>> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, "empathy-engine/0.1")
            .json(&InferenceRequest { inputs: text });
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let res = req
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
        let body = res
            .text()
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
        let parsed: InferenceResponse = serde_json::from_str(&body).map_err(|e| {
            EngineError::BackendUnavailable(format!("unexpected classifier response: {}", e))
        })?;
        Ok(parsed.into_scores())
    }
}

/// Common interface of the model and keyword classifiers.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<ClassificationResult>;
}

/// Turns a backend distribution into a profile label via argmax and aliasing.
pub struct ModelClassifier {
    backend: Box<dyn EmotionBackend>,
    aliases: Arc<AliasTable>,
    profile: Arc<EmotionProfile>,
}

impl ModelClassifier {
    pub fn new(
        backend: Box<dyn EmotionBackend>,
        aliases: Arc<AliasTable>,
        profile: Arc<EmotionProfile>,
    ) -> Self {
        Self {
            backend,
            aliases,
            profile,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    fn resolve(&self, raw: &str) -> EmotionLabel {
        let label = match self.aliases.resolve(raw) {
            Some(label) => label.clone(),
            None => EmotionLabel::from(raw),
        };
        if self.profile.contains(&label) {
            label
        } else {
            warn!("Classifier label `{}` has no profile entry; using neutral", raw);
            EmotionLabel::Neutral
        }
    }
}

impl EmotionClassifier for ModelClassifier {
    fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let scores = self.backend.predict(text)?;
        let mut best: Option<&LabelScore> = None;
        for candidate in scores.iter().filter(|s| s.score.is_finite()) {
            if best.is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        let best = best.ok_or_else(|| {
            EngineError::BackendUnavailable(format!(
                "{} returned an empty distribution",
                self.backend.name()
            ))
        })?;

        debug!("Model top label `{}` ({:.3})", best.label, best.score);
        Ok(ClassificationResult::new(
            self.resolve(&best.label),
            best.score,
            ClassifierSource::Model,
        ))
    }
}

/// Deterministic keyword matcher used when the model cannot answer.
pub struct KeywordClassifier {
    /// In profile order; earlier entries win ties.
    keywords: Vec<(EmotionLabel, HashSet<String>)>,
    confidence: f32,
    word_re: Regex,
}

impl KeywordClassifier {
    pub fn new(keywords: Vec<(EmotionLabel, Vec<String>)>, confidence: f32) -> Result<Self> {
        let word_re = Regex::new(WORD_PATTERN)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let keywords = keywords
            .into_iter()
            .map(|(label, words)| {
                let set = words
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (label, set)
            })
            .collect();
        Ok(Self {
            keywords,
            confidence: confidence.clamp(0.0, 1.0),
            word_re,
        })
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Hit counts per emotion, in table order.
    pub fn hits(&self, text: &str) -> Vec<(&EmotionLabel, usize)> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = self.word_re.find_iter(&lower).map(|m| m.as_str()).collect();

        self.keywords
            .iter()
            .map(|(label, words)| {
                let single = tokens.iter().filter(|t| words.contains(**t)).count();
                // multi-word phrases are matched as substrings
                let phrases = words
                    .iter()
                    .filter(|w| w.contains(char::is_whitespace))
                    .map(|w| lower.matches(w.as_str()).count())
                    .sum::<usize>();
                (label, single + phrases)
            })
            .collect()
    }
}

impl EmotionClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let mut best: Option<(&EmotionLabel, usize)> = None;
        for (label, count) in self.hits(text) {
            if count > 0 && best.is_none_or(|(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        let label = best
            .map(|(label, _)| label.clone())
            .unwrap_or(EmotionLabel::Neutral);
        debug!("Keyword classifier picked `{}`", label);
        Ok(ClassificationResult::new(
            label,
            self.confidence,
            ClassifierSource::Keyword,
        ))
    }
}

/// Route chosen for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierPath {
    EmptyInput,
    Primary,
    Fallback,
}

pub struct ClassifierFacade {
    primary: Option<ModelClassifier>,
    fallback: KeywordClassifier,
    empty_input_confidence: f32,
}

impl ClassifierFacade {
    pub fn new(
        primary: Option<ModelClassifier>,
        fallback: KeywordClassifier,
        empty_input_confidence: f32,
    ) -> Self {
        Self {
            primary,
            fallback,
            empty_input_confidence: empty_input_confidence.clamp(0.0, 1.0),
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn select_path(&self, text: &str) -> ClassifierPath {
        if text.trim().is_empty() {
            ClassifierPath::EmptyInput
        } else if self.primary.as_ref().is_some_and(|p| p.is_available()) {
            ClassifierPath::Primary
        } else {
            ClassifierPath::Fallback
        }
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        match self.select_path(text) {
            ClassifierPath::EmptyInput => ClassificationResult::new(
                EmotionLabel::Neutral,
                self.empty_input_confidence,
                ClassifierSource::EmptyInput,
            ),
            ClassifierPath::Primary => {
                let primary = self.primary.as_ref().map(|p| p.classify(text));
                match primary {
                    Some(Ok(result)) => result,
                    Some(Err(e)) => {
                        warn!("Primary classifier failed, using keyword fallback: {}", e);
                        self.classify_fallback(text)
                    }
                    None => self.classify_fallback(text),
                }
            }
            ClassifierPath::Fallback => self.classify_fallback(text),
        }
    }

    fn classify_fallback(&self, text: &str) -> ClassificationResult {
        match self.fallback.classify(text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Keyword classifier failed: {}", e);
                ClassificationResult::new(
                    EmotionLabel::Neutral,
                    self.fallback.confidence(),
                    ClassifierSource::Keyword,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    struct FixedBackend(Vec<LabelScore>);

    impl EmotionBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _text: &str) -> Result<Vec<LabelScore>> {
            Ok(self.0.clone())
        }
    }

    struct DownBackend;

    impl EmotionBackend for DownBackend {
        fn name(&self) -> &str {
            "down"
        }

        fn predict(&self, _text: &str) -> Result<Vec<LabelScore>> {
            Err(EngineError::BackendUnavailable("connection refused".to_string()))
        }
    }

    fn facade_with(backend: Option<Box<dyn EmotionBackend>>) -> ClassifierFacade {
        let config = EngineConfig::default();
        let profile = Arc::new(config.build_profile().unwrap());
        let aliases = Arc::new(config.build_aliases(&profile).unwrap());
        let primary = backend.map(|b| ModelClassifier::new(b, aliases, profile.clone()));
        let fallback = config.build_keyword_classifier(&profile).unwrap();
        ClassifierFacade::new(primary, fallback, config.empty_input_confidence)
    }

    #[test]
    fn model_argmax_is_aliased() {
        let facade = facade_with(Some(Box::new(FixedBackend(vec![
            LabelScore::new("sadness", 0.1),
            LabelScore::new("joy", 0.85),
            LabelScore::new("anger", 0.05),
        ]))));
        let r = facade.classify("what a day");
        assert_eq!(r.label, EmotionLabel::Happy);
        assert_eq!(r.source, ClassifierSource::Model);
        assert!((r.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn unknown_native_label_resolves_to_neutral() {
        let facade = facade_with(Some(Box::new(FixedBackend(vec![LabelScore::new(
            "boredom", 0.9,
        )]))));
        assert_eq!(facade.classify("meh").label, EmotionLabel::Neutral);
    }

    #[test]
    fn failing_backend_falls_back_to_keywords() {
        let facade = facade_with(Some(Box::new(DownBackend)));
        assert_eq!(facade.select_path("I hate this"), ClassifierPath::Primary);
        let r = facade.classify("I hate this, so frustrating");
        assert_eq!(r.label, EmotionLabel::Angry);
        assert_eq!(r.source, ClassifierSource::Keyword);
        assert!(r.confidence < 0.7);
    }

    #[test]
    fn empty_distribution_falls_back() {
        let facade = facade_with(Some(Box::new(FixedBackend(vec![]))));
        assert_eq!(facade.classify("so sad").source, ClassifierSource::Keyword);
    }

    #[test]
    fn empty_text_short_circuits() {
        let facade = facade_with(Some(Box::new(DownBackend)));
        for text in ["", "   ", "\n\t"] {
            assert_eq!(facade.select_path(text), ClassifierPath::EmptyInput);
            let r = facade.classify(text);
            assert_eq!(r.label, EmotionLabel::Neutral);
            assert_eq!(r.source, ClassifierSource::EmptyInput);
            assert!((r.confidence - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn no_primary_selects_fallback() {
        let facade = facade_with(None);
        assert!(!facade.has_primary());
        assert_eq!(facade.select_path("hello"), ClassifierPath::Fallback);
    }

    #[test]
    fn keyword_ties_go_to_earlier_entry() {
        let kc = KeywordClassifier::new(
            vec![
                (EmotionLabel::Happy, vec!["glad".to_string()]),
                (EmotionLabel::Sad, vec!["sorry".to_string()]),
            ],
            0.5,
        )
        .unwrap();
        let r = kc.classify("glad but sorry").unwrap();
        assert_eq!(r.label, EmotionLabel::Happy);
    }

    #[test]
    fn keywords_match_whole_words_and_phrases() {
        let kc = KeywordClassifier::new(
            vec![
                (EmotionLabel::Sad, vec!["sad".to_string()]),
                (EmotionLabel::Excited, vec!["can't wait".to_string()]),
            ],
            0.5,
        )
        .unwrap();
        assert_eq!(kc.classify("a crusade").unwrap().label, EmotionLabel::Neutral);
        assert_eq!(
            kc.classify("I CAN'T WAIT for it").unwrap().label,
            EmotionLabel::Excited
        );
    }

    #[test]
    fn nested_inference_response_is_flattened() {
        let body = r#"[[{"label":"joy","score":0.9},{"label":"fear","score":0.1}]]"#;
        let parsed: InferenceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_scores().len(), 2);

        let flat = r#"[{"label":"fear","score":0.7}]"#;
        let parsed: InferenceResponse = serde_json::from_str(flat).unwrap();
        assert_eq!(parsed.into_scores()[0].label, "fear");
    }

    #[test]
    fn inactive_config_without_endpoint() {
        let mut c = ClassifierConfig::default();
        assert!(!c.is_active());
        c.endpoint = Some("http://localhost:9/classify".to_string());
        assert!(c.is_active());
        c.enabled = false;
        assert!(!c.is_active());
    }
}
