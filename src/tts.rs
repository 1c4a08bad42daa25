use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

use crate::audio::apply_gain;
use crate::profile::{Emphasis, VoiceParameters};

/// External speech engine: renders text with the given voice to a WAV file.
pub trait Synthesizer: Send + Sync {
    fn render(&self, text: &str, params: &VoiceParameters, out_path: &Path) -> anyhow::Result<()>;
}

/// Piper CLI. Rate maps onto `--length_scale`; volume is applied to the
/// rendered samples afterwards. Piper has no pitch or emphasis control.
pub struct PiperSynthesizer {
    binary: PathBuf,
    model: PathBuf,
    /// Words per minute that Piper's default speed corresponds to.
    baseline_rate: u32,
}

impl PiperSynthesizer {
    pub fn new(model: impl Into<PathBuf>, baseline_rate: u32) -> Self {
        Self {
            binary: PathBuf::from("piper"),
            model: model.into(),
            baseline_rate: baseline_rate.max(1),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Piper stretches phoneme durations, so a faster rate is a smaller scale.
    pub fn length_scale(&self, rate: u32) -> f32 {
        self.baseline_rate as f32 / rate.max(1) as f32
    }
}

impl Synthesizer for PiperSynthesizer {
    fn render(&self, text: &str, params: &VoiceParameters, out_path: &Path) -> anyhow::Result<()> {
        let length_scale = format!("{:.3}", self.length_scale(params.rate));
        if params.pitch != 0.0 || params.emphasis != Emphasis::None {
            debug!(
                "Piper ignores pitch {:+.1} and emphasis {}",
                params.pitch, params.emphasis
            );
        }

        let mut child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(out_path)
            .args(["--length_scale", length_scale.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary.display()))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .context("Failed to open piper stdin")?;
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            error!("Piper TTS command failed for {}", out_path.display());
            anyhow::bail!("TTS engine returned non-zero for {}", out_path.display());
        }

        apply_gain(out_path, params.volume)?;
        info!(
            "Rendered {} (length_scale {}, volume {:.2})",
            out_path.display(),
            length_scale,
            params.volume
        );
        Ok(())
    }
}
