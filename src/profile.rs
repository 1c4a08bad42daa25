//! Emotion profiles and the emotion → voice parameter mapping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::warn;

use crate::emotion::EmotionLabel;
use crate::error::{EngineError, Result};

/// Words per minute.
pub const RATE_RANGE: RangeInclusive<u32> = 50..=400;
/// Relative pitch offset.
pub const PITCH_RANGE: RangeInclusive<f32> = -50.0..=50.0;
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    None,
    Moderate,
    Strong,
}

impl Emphasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for Emphasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesizer-facing acoustic controls for one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameters {
    pub rate: u32,
    pub pitch: f32,
    pub volume: f32,
    pub emphasis: Emphasis,
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            rate: 200,
            pitch: 0.0,
            volume: 0.85,
            emphasis: Emphasis::None,
        }
    }
}

impl VoiceParameters {
    pub const fn new(rate: u32, pitch: f32, volume: f32, emphasis: Emphasis) -> Self {
        Self {
            rate,
            pitch,
            volume,
            emphasis,
        }
    }

    /// Check every field against its documented domain.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !RATE_RANGE.contains(&self.rate) {
            return Err(format!(
                "rate {} outside {}..={}",
                self.rate,
                RATE_RANGE.start(),
                RATE_RANGE.end()
            ));
        }
        if !PITCH_RANGE.contains(&self.pitch) {
            return Err(format!("pitch {} outside -50..=50", self.pitch));
        }
        if !VOLUME_RANGE.contains(&self.volume) {
            return Err(format!("volume {} outside 0..=1", self.volume));
        }
        Ok(())
    }
}

/// Read-only table of base voice parameters per emotion.
///
/// Entries keep their declaration order, which is also the tie-break order
/// used by the keyword classifier.
#[derive(Debug, Clone)]
pub struct EmotionProfile {
    entries: Vec<(EmotionLabel, VoiceParameters)>,
    neutral: VoiceParameters,
}

impl EmotionProfile {
    pub fn new(entries: Vec<(EmotionLabel, VoiceParameters)>) -> Result<Self> {
        let neutral = entries
            .iter()
            .find(|(label, _)| label.is_neutral())
            .map(|(_, params)| *params)
            .ok_or_else(|| {
                EngineError::Configuration("emotion profile has no `neutral` entry".to_string())
            })?;

        for (i, (label, params)) in entries.iter().enumerate() {
            params.validate().map_err(|e| {
                EngineError::Configuration(format!("profile `{}`: {}", label, e))
            })?;
            if entries[..i].iter().any(|(other, _)| other == label) {
                return Err(EngineError::Configuration(format!(
                    "profile `{}` declared twice",
                    label
                )));
            }
        }

        Ok(Self { entries, neutral })
    }

    pub fn get(&self, label: &EmotionLabel) -> Option<&VoiceParameters> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, params)| params)
    }

    pub fn contains(&self, label: &EmotionLabel) -> bool {
        self.get(label).is_some()
    }

    pub fn neutral(&self) -> &VoiceParameters {
        &self.neutral
    }

    pub fn entries(&self) -> &[(EmotionLabel, VoiceParameters)] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &EmotionLabel> {
        self.entries.iter().map(|(label, _)| label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EmotionProfile {
    fn default() -> Self {
        use EmotionLabel::*;
        let entries = vec![
            (Happy, VoiceParameters::new(220, 10.0, 0.95, Emphasis::Strong)),
            (Excited, VoiceParameters::new(240, 15.0, 1.0, Emphasis::Strong)),
            (Sad, VoiceParameters::new(160, -10.0, 0.7, Emphasis::None)),
            (Angry, VoiceParameters::new(200, 5.0, 0.9, Emphasis::Strong)),
            (Worried, VoiceParameters::new(180, -5.0, 0.8, Emphasis::Moderate)),
            (Surprised, VoiceParameters::new(210, 12.0, 0.9, Emphasis::Strong)),
            (Disgusted, VoiceParameters::new(170, -8.0, 0.8, Emphasis::None)),
            (Neutral, VoiceParameters::new(200, 0.0, 0.85, Emphasis::None)),
        ];
        Self {
            neutral: entries[7].1,
            entries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmphasisThresholds {
    pub strong: f32,
    pub moderate: f32,
}

impl Default for EmphasisThresholds {
    fn default() -> Self {
        Self {
            strong: 0.8,
            moderate: 0.5,
        }
    }
}

impl EmphasisThresholds {
    pub fn select(&self, intensity: f32) -> Emphasis {
        if intensity >= self.strong {
            Emphasis::Strong
        } else if intensity >= self.moderate {
            Emphasis::Moderate
        } else {
            Emphasis::None
        }
    }
}

/// Scales an emotion's deviation from neutral delivery by intensity.
#[derive(Debug, Clone)]
pub struct ParameterMapper {
    profile: Arc<EmotionProfile>,
    thresholds: EmphasisThresholds,
}

impl ParameterMapper {
    pub fn new(profile: Arc<EmotionProfile>, thresholds: EmphasisThresholds) -> Self {
        Self {
            profile,
            thresholds,
        }
    }

    pub fn profile(&self) -> &EmotionProfile {
        &self.profile
    }

    /// Total over every label: unknown labels map from the neutral entry.
    pub fn map(&self, emotion: &EmotionLabel, intensity: f32) -> VoiceParameters {
        let neutral = *self.profile.neutral();
        let base = match self.profile.get(emotion) {
            Some(params) => *params,
            None => {
                warn!("No profile entry for emotion `{}`; using neutral", emotion);
                neutral
            }
        };
        let t = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };

        let lerp = |from: f32, to: f32| from + t * (to - from);

        let rate = lerp(neutral.rate as f32, base.rate as f32)
            .round()
            .clamp(*RATE_RANGE.start() as f32, *RATE_RANGE.end() as f32) as u32;
        let pitch = lerp(neutral.pitch, base.pitch).clamp(*PITCH_RANGE.start(), *PITCH_RANGE.end());
        let volume =
            lerp(neutral.volume, base.volume).clamp(*VOLUME_RANGE.start(), *VOLUME_RANGE.end());
        // never more emphasis than the emotion itself carries
        let emphasis = self.thresholds.select(t).min(base.emphasis);

        VoiceParameters {
            rate,
            pitch,
            volume,
            emphasis,
        }
    }
}
