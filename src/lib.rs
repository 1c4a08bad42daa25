//! Emotion-aware voice parameters for text-to-speech.
//!
//! Text is classified into an emotion, scored for intensity from surface cues,
//! and mapped onto rate, pitch, volume and emphasis for an external speech
//! engine.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod emotion;
pub mod error;
pub mod input;
pub mod intensity;
pub mod pipeline;
pub mod profile;
pub mod ssml;
pub mod tts;

pub use classifier::{ClassifierConfig, ClassifierFacade, EmotionBackend, LabelScore};
pub use config::EngineConfig;
pub use emotion::{ClassificationResult, ClassifierSource, EmotionLabel};
pub use error::{EngineError, Result};
pub use intensity::IntensityScorer;
pub use pipeline::{Analysis, Pipeline};
pub use profile::{Emphasis, EmotionProfile, ParameterMapper, VoiceParameters};
pub use tts::{PiperSynthesizer, Synthesizer};
