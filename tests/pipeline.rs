//! End-to-end tests of the text → voice parameter pipeline.

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use empathy_engine::{
    ClassifierSource, Emphasis, EmotionBackend, EmotionLabel, EngineConfig, EngineError,
    LabelScore, Pipeline, Result,
};

/// Returns a fixed distribution and counts how often it was asked.
struct StaticBackend {
    scores: Vec<LabelScore>,
    calls: Arc<AtomicUsize>,
}

impl StaticBackend {
    fn new(scores: &[(&str, f32)]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = Self {
            scores: scores.iter().map(|(l, s)| LabelScore::new(*l, *s)).collect(),
            calls: calls.clone(),
        };
        (backend, calls)
    }
}

impl EmotionBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    fn predict(&self, _text: &str) -> Result<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

struct FailingBackend;

impl EmotionBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _text: &str) -> Result<Vec<LabelScore>> {
        Err(EngineError::BackendUnavailable("model not loaded".to_string()))
    }
}

fn with_backend(backend: impl EmotionBackend + 'static) -> Pipeline {
    Pipeline::with_backend(&EngineConfig::default(), Some(Box::new(backend))).unwrap()
}

#[test]
fn excited_scenario_with_model() {
    let (backend, _) = StaticBackend::new(&[("joy", 0.04), ("excited", 0.93), ("neutral", 0.03)]);
    let pipeline = with_backend(backend);

    let a = pipeline.analyze("I'm so excited about this amazing project!");
    assert_eq!(a.classification.label, EmotionLabel::Excited);
    assert_eq!(a.classification.source, ClassifierSource::Model);
    assert_eq!(a.intensity, 1.0);
    assert_eq!(a.voice_params.rate, 240);
    assert!((a.voice_params.pitch - 15.0).abs() < 1e-4);
    assert!((a.voice_params.volume - 1.0).abs() < 1e-4);
    assert_eq!(a.voice_params.emphasis, Emphasis::Strong);
}

#[test]
fn neutral_scenario_with_model() {
    let (backend, _) = StaticBackend::new(&[("neutral", 0.35), ("joy", 0.2)]);
    let pipeline = with_backend(backend);

    let a = pipeline.analyze("Hello, this is a neutral statement.");
    assert_eq!(a.classification.label, EmotionLabel::Neutral);
    assert!((a.intensity - 0.35).abs() < 1e-6);
    assert_eq!(a.voice_params.emphasis, Emphasis::None);
    assert_eq!(a.voice_params.rate, 200);
}

#[test]
fn shouting_saturates_regardless_of_confidence() {
    for confidence in [0.0, 0.3, 0.9] {
        let (backend, _) = StaticBackend::new(&[("surprise", confidence)]);
        let a = with_backend(backend).analyze("AMAZING JOB!!!");
        if confidence >= 0.4 {
            assert_eq!(a.intensity, 1.0);
        } else {
            assert!(a.intensity >= 0.6 - 1e-6);
        }
        assert_eq!(a.cues.count(), 3);
    }
}

#[test]
fn empty_input_never_reaches_backend() {
    let (backend, calls) = StaticBackend::new(&[("joy", 0.99)]);
    let pipeline = with_backend(backend);

    let a = pipeline.analyze("   ");
    assert_eq!(a.classification.label, EmotionLabel::Neutral);
    assert_eq!(a.classification.source, ClassifierSource::EmptyInput);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let failing = with_backend(FailingBackend).analyze("");
    assert_eq!(failing.classification, a.classification);
}

#[test]
fn backend_failure_uses_keyword_fallback() {
    let (backend, _) = StaticBackend::new(&[("joy", 0.97)]);
    let model_confidence = with_backend(backend)
        .analyze("I love this")
        .classification
        .confidence;

    let a = with_backend(FailingBackend).analyze("I love this, it's wonderful");
    assert_eq!(a.classification.label, EmotionLabel::Happy);
    assert_eq!(a.classification.source, ClassifierSource::Keyword);
    assert!(a.classification.confidence < model_confidence);
}

#[test]
fn refused_connection_falls_back() {
    // bind then drop so the port is closed
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut config = EngineConfig::default();
    config.classifier.endpoint = Some(format!("http://127.0.0.1:{}/classify", port));
    config.classifier.timeout_ms = 500;
    config.classifier.api_token_env = None;

    let pipeline = Pipeline::from_config(&config).unwrap();
    assert!(pipeline.classifier().has_primary());
    let a = pipeline.analyze("I am so sad today");
    assert_eq!(a.classification.source, ClassifierSource::Keyword);
    assert_eq!(a.classification.label, EmotionLabel::Sad);
}

#[test]
fn hung_backend_times_out_to_fallback() {
    // accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let mut config = EngineConfig::default();
    config.classifier.endpoint = Some(format!("http://{}/classify", addr));
    config.classifier.timeout_ms = 200;
    config.classifier.api_token_env = None;

    let pipeline = Pipeline::from_config(&config).unwrap();
    let start = Instant::now();
    let a = pipeline.analyze("I'm worried and nervous");
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(a.classification.source, ClassifierSource::Keyword);
    assert_eq!(a.classification.label, EmotionLabel::Worried);
    drop(listener);
}

#[test]
fn disabled_model_is_keyword_only() {
    let mut config = EngineConfig::default();
    config.classifier.enabled = false;
    config.classifier.endpoint = Some("http://127.0.0.1:1/classify".to_string());
    let pipeline = Pipeline::from_config(&config).unwrap();
    assert!(!pipeline.classifier().has_primary());
    assert_eq!(
        pipeline.analyze("this is disgusting").classification.label,
        EmotionLabel::Disgusted
    );
}

#[test]
fn zero_and_full_intensity_bounds_hold_for_every_emotion() {
    let pipeline = Pipeline::with_backend(&EngineConfig::default(), None).unwrap();
    let mapper = pipeline.mapper();
    let neutral = *mapper.profile().neutral();
    for (label, base) in mapper.profile().entries() {
        let low = mapper.map(label, 0.0);
        assert_eq!(low.rate, neutral.rate);
        assert!((low.volume - neutral.volume).abs() < 1e-4);
        let high = mapper.map(label, 1.0);
        assert_eq!(high.rate, base.rate);
        assert!((high.pitch - base.pitch).abs() < 1e-4);
    }
}

#[test]
fn concurrent_requests_are_independent() {
    let (backend, calls) = StaticBackend::new(&[("anger", 0.8)]);
    let pipeline = Arc::new(with_backend(backend));
    let expected = pipeline.synthesize_parameters("This is unacceptable!");

    std::thread::scope(|s| {
        for _ in 0..8 {
            let pipeline = pipeline.clone();
            s.spawn(move || {
                for _ in 0..25 {
                    assert_eq!(pipeline.synthesize_parameters("This is unacceptable!"), expected);
                }
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1 + 8 * 25);
}

#[test]
fn custom_emotion_flows_end_to_end() {
    let json = r#"{
        "profiles": [
            { "emotion": "neutral", "rate": 200, "pitch": 0.0, "volume": 0.85, "emphasis": "none" },
            { "emotion": "calm", "rate": 170, "pitch": -4.0, "volume": 0.7, "emphasis": "moderate" }
        ],
        "aliases": { "serenity": "calm" },
        "keywords": { "calm": ["peaceful", "relaxed"] }
    }"#;
    let config = EngineConfig::from_json_str(json).unwrap();

    let (backend, _) = StaticBackend::new(&[("serenity", 0.9)]);
    let pipeline = Pipeline::with_backend(&config, Some(Box::new(backend))).unwrap();
    let a = pipeline.analyze("quiet evening");
    assert_eq!(a.classification.label, EmotionLabel::from("calm"));
    assert_eq!(a.voice_params.rate, 173);
    assert_eq!(a.voice_params.emphasis, Emphasis::Moderate);

    let keyword_only = Pipeline::with_backend(&config, None).unwrap();
    assert_eq!(
        keyword_only.analyze("so relaxed").classification.label,
        EmotionLabel::from("calm")
    );
}
