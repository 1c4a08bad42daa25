use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Emotion-aware text-to-speech. Without --text or --batch an interactive
/// prompt starts.
#[derive(Parser, Debug)]
#[clap(name = "empathy-engine", version)]
pub struct Args {
    /// Process a single utterance and exit
    #[clap(long, conflicts_with = "batch")]
    pub text: Option<String>,

    /// JSON file holding an array of strings or {"text": ...} objects
    #[clap(long)]
    pub batch: Option<PathBuf>,

    #[clap(long, default_value = "./config/empathy.json")]
    pub config: PathBuf,

    /// Text-classification endpoint; overrides the config file
    #[clap(long)]
    pub classifier_url: Option<String>,

    #[clap(long)]
    pub classifier_timeout_ms: Option<u64>,

    /// Use only the keyword classifier
    #[clap(long)]
    pub no_model: bool,

    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also print the SSML rendering
    #[clap(long)]
    pub ssml: bool,

    /// Piper voice model; enables audio rendering
    #[clap(long)]
    pub piper_model: Option<PathBuf>,

    #[clap(long, default_value = "piper")]
    pub piper_binary: PathBuf,

    #[clap(long, default_value = "./out")]
    pub out_dir: PathBuf,

    #[clap(short, long)]
    pub verbose: bool,
}
