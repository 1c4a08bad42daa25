mod args;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use args::{Args, OutputFormat};
use empathy_engine::audio::wav_duration_seconds;
use empathy_engine::{input, ssml, Analysis, EngineConfig, Pipeline, PiperSynthesizer, Synthesizer};

#[derive(Debug, Serialize)]
struct Record {
    index: usize,
    text: String,
    #[serde(flatten)]
    analysis: Analysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_path: Option<PathBuf>,
}

/// Per-process state shared by every request.
#[derive(Clone)]
struct Session {
    pipeline: Arc<Pipeline>,
    synth: Option<Arc<dyn Synthesizer>>,
    out_dir: PathBuf,
    format: OutputFormat,
    with_ssml: bool,
    baseline_rate: u32,
}

impl Session {
    /// Runs the pipeline (and the synthesizer, if any) on a blocking thread;
    /// the classifier backend call may block up to its timeout.
    async fn process(&self, index: usize, text: String) -> anyhow::Result<Record> {
        let session = self.clone();
        tokio::task::spawn_blocking(move || session.process_blocking(index, text)).await?
    }

    fn process_blocking(&self, index: usize, text: String) -> anyhow::Result<Record> {
        let analysis = self.pipeline.analyze(&text);
        let ssml = self
            .with_ssml
            .then(|| ssml::render(&text, &analysis.voice_params, self.baseline_rate));

        let audio_path = match &self.synth {
            Some(synth) if !text.trim().is_empty() => {
                let path = self.out_dir.join(format!("utterance_{:03}.wav", index));
                synth.render(&text, &analysis.voice_params, &path)?;
                Some(path)
            }
            Some(_) => {
                debug!("Skipping audio for empty utterance {}", index);
                None
            }
            None => None,
        };

        Ok(Record {
            index,
            text,
            analysis,
            ssml,
            audio_path,
        })
    }

    fn print(&self, record: &Record) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(record)?),
            OutputFormat::Text => {
                let a = &record.analysis;
                let p = &a.voice_params;
                println!("Emotion:    {} ({})", a.classification.label, a.classification.source);
                println!("Confidence: {:.2}", a.classification.confidence);
                println!("Intensity:  {:.2}", a.intensity);
                println!("Rate:       {} WPM", p.rate);
                println!("Pitch:      {:+.1}", p.pitch);
                println!("Volume:     {:.2}", p.volume);
                println!("Emphasis:   {}", p.emphasis);
                if let Some(ssml) = &record.ssml {
                    println!("SSML:       {}", ssml);
                }
                if let Some(path) = &record.audio_path {
                    let dur = wav_duration_seconds(path).unwrap_or(0.0);
                    println!("Audio:      {} ({:.2}s)", path.display(), dur);
                }
                println!("{}", "=".repeat(50));
            }
        }
        Ok(())
    }

    fn print_rejected(&self, index: usize, err: &dyn std::fmt::Display) {
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "index": index, "error": err.to_string() })
            ),
            OutputFormat::Text => println!("#{} rejected: {}", index, err),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting empathy engine");

    let mut config = EngineConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(url) = &args.classifier_url {
        config.classifier.endpoint = Some(url.clone());
    }
    if let Some(ms) = args.classifier_timeout_ms {
        config.classifier.timeout_ms = ms;
    }
    if args.no_model {
        config.classifier.enabled = false;
    }

    // created and dropped outside the runtime; the blocking HTTP client owns its own
    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    let baseline_rate = pipeline.mapper().profile().neutral().rate;

    let synth: Option<Arc<dyn Synthesizer>> = match &args.piper_model {
        Some(model) => {
            if !model.exists() {
                error!("Piper model not found: {}", model.display());
                anyhow::bail!("Piper model not found: {}", model.display());
            }
            fs::create_dir_all(&args.out_dir)?;
            info!("Rendering audio into {}", args.out_dir.display());
            let piper: Arc<dyn Synthesizer> = Arc::new(
                PiperSynthesizer::new(model, baseline_rate).with_binary(&args.piper_binary),
            );
            Some(piper)
        }
        None => None,
    };

    let session = Session {
        pipeline: pipeline.clone(),
        synth,
        out_dir: args.out_dir.clone(),
        format: args.format,
        with_ssml: args.ssml,
        baseline_rate,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(&args, session));
    drop(runtime);
    drop(pipeline);

    info!("Process complete.");
    result
}

async fn run(args: &Args, session: Session) -> anyhow::Result<()> {
    if let Some(text) = &args.text {
        let record = session.process(0, text.clone()).await?;
        return session.print(&record);
    }
    if let Some(path) = &args.batch {
        return run_batch(path, session).await;
    }
    prompt_loop(session).await
}

async fn run_batch(path: &Path, session: Session) -> anyhow::Result<()> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&data)?;
    let items = input::batch_from_json(&doc);
    info!("Processing {} batch items", items.len());

    let mut tasks = JoinSet::new();
    let mut results = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Ok(text) => {
                let session = session.clone();
                let text = text.to_string();
                tasks.spawn(async move { (i, session.process(i, text).await) });
            }
            Err(e) => {
                warn!("Batch item {} rejected: {}", i, e);
                results.push((i, Err(anyhow::Error::from(e))));
            }
        }
    }
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(i, _)| *i);

    let mut failed = 0;
    for (i, result) in results {
        match result {
            Ok(record) => session.print(&record)?,
            Err(e) => {
                failed += 1;
                session.print_rejected(i, &e);
            }
        }
    }
    if failed > 0 {
        warn!("{} batch item(s) failed", failed);
    }
    Ok(())
}

async fn prompt_loop(session: Session) -> anyhow::Result<()> {
    println!("Empathy Engine - enter text to analyze ('quit' to exit)");
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    let mut index = 0;

    loop {
        print!("Enter text: ");
        std::io::stdout().flush()?;

        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let text = match input::text_from_bytes(&buf) {
            Ok(text) => text.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) => {
                session.print_rejected(index, &e);
                continue;
            }
        };
        if matches!(text.trim().to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        match session.process(index, text).await {
            Ok(record) => session.print(&record)?,
            Err(e) => {
                error!("Failed to process input {}: {:?}", index, e);
                println!("Error: {}", e);
            }
        }
        index += 1;
    }

    println!("Goodbye!");
    Ok(())
}
