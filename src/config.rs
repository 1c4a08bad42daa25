//! Engine configuration
//!
//! Loaded once at startup from an optional JSON file, validated, and turned
//! into the immutable tables the pipeline reads from. Every field has a
//! default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::classifier::{ClassifierConfig, KeywordClassifier};
use crate::emotion::{AliasTable, EmotionLabel};
use crate::error::{EngineError, Result};
use crate::intensity::IntensityConfig;
use crate::profile::{EmotionProfile, EmphasisThresholds, VoiceParameters};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub emotion: EmotionLabel,
    #[serde(flatten)]
    pub params: VoiceParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    /// Base voice per emotion; declaration order is the keyword tie-break order.
    pub profiles: Vec<ProfileEntry>,
    /// Classifier-native label → profile label.
    pub aliases: BTreeMap<String, EmotionLabel>,
    pub keywords: BTreeMap<EmotionLabel, Vec<String>>,
    pub intensity: IntensityConfig,
    pub emphasis: EmphasisThresholds,
    /// Confidence reported for every keyword-classifier result.
    pub fallback_confidence: f32,
    /// Confidence reported for empty or whitespace-only input.
    pub empty_input_confidence: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let profiles = EmotionProfile::default()
            .entries()
            .iter()
            .map(|(emotion, params)| ProfileEntry {
                emotion: emotion.clone(),
                params: *params,
            })
            .collect();

        let aliases = [
            ("joy", EmotionLabel::Happy),
            ("sadness", EmotionLabel::Sad),
            ("anger", EmotionLabel::Angry),
            ("fear", EmotionLabel::Worried),
            ("surprise", EmotionLabel::Surprised),
            ("disgust", EmotionLabel::Disgusted),
            ("neutral", EmotionLabel::Neutral),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        let keywords = BTreeMap::from([
            (
                EmotionLabel::Happy,
                words(&[
                    "happy", "glad", "great", "good", "love", "wonderful", "joy", "pleased",
                    "delighted", "excellent", "fantastic",
                ]),
            ),
            (
                EmotionLabel::Excited,
                words(&[
                    "excited", "thrilled", "amazing", "awesome", "incredible", "ecstatic",
                    "pumped", "can't wait",
                ]),
            ),
            (
                EmotionLabel::Sad,
                words(&[
                    "sad", "unhappy", "depressed", "miserable", "lonely", "heartbroken", "cry",
                    "crying", "disappointed",
                ]),
            ),
            (
                EmotionLabel::Angry,
                words(&[
                    "angry", "furious", "hate", "mad", "annoyed", "annoying", "frustrated",
                    "frustrating", "outraged", "terrible", "awful",
                ]),
            ),
            (
                EmotionLabel::Worried,
                words(&[
                    "worried", "anxious", "nervous", "afraid", "scared", "fear", "concerned",
                    "stressed",
                ]),
            ),
            (
                EmotionLabel::Surprised,
                words(&[
                    "surprised", "shocked", "wow", "unexpected", "astonished", "unbelievable",
                ]),
            ),
            (
                EmotionLabel::Disgusted,
                words(&["disgusted", "gross", "disgusting", "revolting", "nasty"]),
            ),
        ]);

        Self {
            classifier: ClassifierConfig::default(),
            profiles,
            aliases,
            keywords,
            intensity: IntensityConfig::default(),
            emphasis: EmphasisThresholds::default(),
            fallback_confidence: 0.5,
            empty_input_confidence: 0.2,
        }
    }
}

impl EngineConfig {
    /// Load from `path`; a missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config {} not found, using built-in defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let data = fs::read_to_string(path)?;
        let config = Self::from_json_str(&data)?;
        info!(
            "Loaded config from {} ({} emotions, {} aliases)",
            path.display(),
            config.profiles.len(),
            config.aliases.len()
        );
        Ok(config)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let profile = self.build_profile()?;
        self.build_aliases(&profile)?;

        for label in self.keywords.keys() {
            if !profile.contains(label) {
                return Err(EngineError::Configuration(format!(
                    "keywords given for `{}`, which has no profile entry",
                    label
                )));
            }
        }

        let unit = 0.0_f32..=1.0;
        for (name, value) in [
            ("emphasis.strong", self.emphasis.strong),
            ("emphasis.moderate", self.emphasis.moderate),
            ("fallback_confidence", self.fallback_confidence),
            ("empty_input_confidence", self.empty_input_confidence),
            ("intensity.caps_threshold", self.intensity.caps_threshold),
        ] {
            if !unit.contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} = {} is outside [0, 1]",
                    name, value
                )));
            }
        }
        if self.emphasis.moderate > self.emphasis.strong {
            return Err(EngineError::Configuration(
                "emphasis.moderate must not exceed emphasis.strong".to_string(),
            ));
        }
        for (name, value) in [
            ("intensity.superlative_boost", self.intensity.superlative_boost),
            ("intensity.exclamation_boost", self.intensity.exclamation_boost),
            ("intensity.caps_boost", self.intensity.caps_boost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "{} = {} must be a non-negative number",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn build_profile(&self) -> Result<EmotionProfile> {
        EmotionProfile::new(
            self.profiles
                .iter()
                .map(|entry| (entry.emotion.clone(), entry.params))
                .collect(),
        )
    }

    /// Configured aliases plus an identity alias for every profile label.
    pub fn build_aliases(&self, profile: &EmotionProfile) -> Result<AliasTable> {
        for (native, target) in &self.aliases {
            if !profile.contains(target) {
                return Err(EngineError::Configuration(format!(
                    "alias `{}` points at `{}`, which has no profile entry",
                    native, target
                )));
            }
        }
        let identity = profile
            .labels()
            .map(|label| (label.as_str().to_string(), label.clone()));
        let configured = self
            .aliases
            .iter()
            .map(|(native, target)| (native.clone(), target.clone()));
        Ok(AliasTable::new(identity.chain(configured)))
    }

    /// Keyword classifier with entries ordered like the profile table.
    pub fn build_keyword_classifier(&self, profile: &EmotionProfile) -> Result<KeywordClassifier> {
        let ordered = profile
            .labels()
            .filter_map(|label| {
                self.keywords
                    .get(label)
                    .map(|words| (label.clone(), words.clone()))
            })
            .collect();
        KeywordClassifier::new(ordered, self.fallback_confidence)
    }
}
