//! Lexical intensity scoring
//!
//! Turns classifier confidence plus surface cues (strong-affect vocabulary,
//! exclamation marks, shouting) into a single intensity in [0, 1].

use serde::{Deserialize, Serialize};

/// Tunables for [`IntensityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Lowercase substrings that mark strong affect.
    pub high_intensity_words: Vec<String>,
    pub superlative_boost: f32,
    pub exclamation_boost: f32,
    pub caps_boost: f32,
    /// Uppercase-to-total character ratio above which the caps boost fires.
    pub caps_threshold: f32,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            high_intensity_words: [
                "amazing",
                "incredible",
                "fantastic",
                "terrible",
                "awful",
                "furious",
                "ecstatic",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            superlative_boost: 0.30,
            exclamation_boost: 0.10,
            caps_boost: 0.20,
            caps_threshold: 0.30,
        }
    }
}

/// Which boosts fired for a given text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityCues {
    pub superlative: bool,
    pub exclamation: bool,
    pub caps: bool,
}

impl IntensityCues {
    pub fn count(&self) -> usize {
        [self.superlative, self.exclamation, self.caps]
            .iter()
            .filter(|fired| **fired)
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntensityScorer {
    config: IntensityConfig,
}

impl IntensityScorer {
    pub fn new(mut config: IntensityConfig) -> Self {
        for word in config.high_intensity_words.iter_mut() {
            *word = word.to_lowercase();
        }
        Self { config }
    }

    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }

    pub fn cues(&self, text: &str) -> IntensityCues {
        let lower = text.to_lowercase();
        let superlative = self
            .config
            .high_intensity_words
            .iter()
            .any(|w| !w.is_empty() && lower.contains(w.as_str()));
        let exclamation = text.contains('!');

        let total = text.chars().count();
        let caps = if total == 0 {
            false
        } else {
            let upper = text
                .chars()
                .filter(|c| c.is_alphabetic() && c.is_uppercase())
                .count();
            upper as f32 / total as f32 > self.config.caps_threshold
        };

        IntensityCues {
            superlative,
            exclamation,
            caps,
        }
    }

    /// Base confidence plus every boost that fires, clamped to [0, 1].
    ///
    /// Boosts are additive and independent; they are not renormalized, so
    /// strongly marked text saturates at 1.0.
    pub fn score(&self, text: &str, base_confidence: f32) -> f32 {
        let cues = self.cues(text);
        let mut score = if base_confidence.is_nan() {
            0.0
        } else {
            base_confidence
        };

        if cues.superlative {
            score += self.config.superlative_boost;
        }
        if cues.exclamation {
            score += self.config.exclamation_boost;
        }
        if cues.caps {
            score += self.config.caps_boost;
        }

        score.clamp(0.0, 1.0)
    }
}
