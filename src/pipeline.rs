//! Text → emotion → intensity → voice parameters

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::classifier::{
    ClassifierFacade, EmotionBackend, HttpBackend, ModelClassifier,
};
use crate::config::EngineConfig;
use crate::emotion::ClassificationResult;
use crate::error::Result;
use crate::intensity::{IntensityCues, IntensityScorer};
use crate::profile::{ParameterMapper, VoiceParameters};

/// Everything the pipeline derived for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    #[serde(flatten)]
    pub classification: ClassificationResult,
    pub intensity: f32,
    pub cues: IntensityCues,
    pub voice_params: VoiceParameters,
}

/// Shared, read-only after construction; safe to call from many threads.
pub struct Pipeline {
    classifier: ClassifierFacade,
    scorer: IntensityScorer,
    mapper: ParameterMapper,
}

impl Pipeline {
    /// Build from config, connecting the HTTP backend when one is configured.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let backend: Option<Box<dyn EmotionBackend>> = if config.classifier.is_active() {
            let backend = HttpBackend::new(&config.classifier)?;
            info!(
                "Primary classifier: {} (timeout {} ms)",
                backend.name(),
                config.classifier.timeout_ms
            );
            Some(Box::new(backend))
        } else {
            info!("Primary classifier disabled; using keyword classifier only");
            None
        };
        Self::with_backend(config, backend)
    }

    pub fn with_backend(
        config: &EngineConfig,
        backend: Option<Box<dyn EmotionBackend>>,
    ) -> Result<Self> {
        config.validate()?;
        let profile = Arc::new(config.build_profile()?);
        let aliases = Arc::new(config.build_aliases(&profile)?);
        let fallback = config.build_keyword_classifier(&profile)?;
        let primary = backend.map(|b| ModelClassifier::new(b, aliases, profile.clone()));

        Ok(Self {
            classifier: ClassifierFacade::new(primary, fallback, config.empty_input_confidence),
            scorer: IntensityScorer::new(config.intensity.clone()),
            mapper: ParameterMapper::new(profile, config.emphasis),
        })
    }

    pub fn classifier(&self) -> &ClassifierFacade {
        &self.classifier
    }

    pub fn mapper(&self) -> &ParameterMapper {
        &self.mapper
    }

    pub fn analyze(&self, text: &str) -> Analysis {
        let classification = self.classifier.classify(text);
        let cues = self.scorer.cues(text);
        let intensity = self.scorer.score(text, classification.confidence);
        let voice_params = self.mapper.map(&classification.label, intensity);

        debug!(
            "{} via {} (confidence {:.2}, {} cues) -> intensity {:.2}",
            classification.label,
            classification.source,
            classification.confidence,
            cues.count(),
            intensity
        );

        Analysis {
            classification,
            intensity,
            cues,
            voice_params,
        }
    }

    pub fn synthesize_parameters(&self, text: &str) -> VoiceParameters {
        self.analyze(text).voice_params
    }
}
