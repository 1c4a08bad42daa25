use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Categorical tag for the dominant affect of an utterance.
///
/// The built-in variants cover the default profile table. Emotions added through
/// configuration at startup are carried as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionLabel {
    Happy,
    Excited,
    Sad,
    Angry,
    Worried,
    Surprised,
    Disgusted,
    Neutral,
    Custom(String),
}

impl EmotionLabel {
    pub const BUILTIN: [EmotionLabel; 8] = [
        EmotionLabel::Happy,
        EmotionLabel::Excited,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Worried,
        EmotionLabel::Surprised,
        EmotionLabel::Disgusted,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Excited => "excited",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Worried => "worried",
            Self::Surprised => "surprised",
            Self::Disgusted => "disgusted",
            Self::Neutral => "neutral",
            Self::Custom(name) => name,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl From<&str> for EmotionLabel {
    fn from(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "happy" => Self::Happy,
            "excited" => Self::Excited,
            "sad" => Self::Sad,
            "angry" => Self::Angry,
            "worried" => Self::Worried,
            "surprised" => Self::Surprised,
            "disgusted" => Self::Disgusted,
            "neutral" => Self::Neutral,
            _ => Self::Custom(lower),
        }
    }
}

impl From<String> for EmotionLabel {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EmotionLabel> for String {
    fn from(label: EmotionLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classifier path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierSource {
    Model,
    Keyword,
    EmptyInput,
}

impl fmt::Display for ClassifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Model => "model",
            Self::Keyword => "keyword",
            Self::EmptyInput => "empty-input",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    /// In [0, 1].
    pub confidence: f32,
    pub source: ClassifierSource,
}

impl ClassificationResult {
    pub fn new(label: EmotionLabel, confidence: f32, source: ClassifierSource) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

/// Maps classifier-native labels ("joy", "anger", ...) onto profile labels.
///
/// Keys are stored lowercase. Built once at startup and never mutated after.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, EmotionLabel>,
}

impl AliasTable {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, EmotionLabel)>,
        K: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v))
                .collect(),
        }
    }

    pub fn resolve(&self, raw: &str) -> Option<&EmotionLabel> {
        self.entries.get(&raw.trim().to_lowercase())
    }

    pub fn targets(&self) -> impl Iterator<Item = &EmotionLabel> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
