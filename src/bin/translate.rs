//! Translate text from the command line through the same service as the HTTP API.
//!
//! Usage:
//!   cargo run --bin translate -- --to Hindi "Hello, world"
//!   cargo run --bin translate -- --from French --to German --temperature 0.7 "Bonjour"
//!   cargo run --bin translate -- --to Spanish --output out.txt --speak out.mp3 "Good morning"
//!
//! Run with `--help` for the full list of options.

use anyhow::{Context, Result};
use clap::Parser;
use polyglot::config::Config;
use polyglot::i18n::AUTO_DETECT_NAME;
use polyglot::service::{TranslationRequest, TranslationService};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "translate", version, about = "Translate text between supported languages")]
struct Args {
    /// Source language, or "Auto Detect"
    #[arg(long, default_value = AUTO_DETECT_NAME)]
    from: String,

    /// Target language
    #[arg(long, default_value = "Hindi")]
    to: String,

    /// Display-only sampling temperature in [0, 1]
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    /// Hide the confidence estimate
    #[arg(long)]
    no_confidence: bool,

    /// Also write the translation to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Synthesize the translation and write MP3 audio to this file
    #[arg(long)]
    speak: Option<PathBuf>,

    /// Text to translate
    text: Vec<String>,
}

impl Args {
    fn request(&self) -> TranslationRequest {
        let mut request = TranslationRequest::new(self.text.join(" "), &self.from, &self.to);
        request.temperature = self.temperature;
        request.show_confidence = !self.no_confidence;
        request.speak = self.speak.is_some();
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env()?;
    let service = TranslationService::from_config(reqwest::Client::new(), &config);

    let response = match service.translate(&args.request()).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("{}", e.user_message());
            if e.is_retryable() {
                eprintln!("This may be temporary, try again.");
            }
            std::process::exit(1);
        }
    };

    println!("{}", response.translation);
    println!();
    println!(
        "{} ({}) -> {} ({}) via {} [{}]",
        response.source.name,
        response.source.code,
        response.target.name,
        response.target.code,
        response.engine,
        response.strategy
    );
    if let Some(confidence) = response.confidence {
        println!("Confidence: {:.3}", confidence);
    }

    if let Some(path) = &args.output {
        fs::write(path, &response.translation)
            .with_context(|| format!("Failed to write translation to {}", path.display()))?;
        info!("Saved translation to {}", path.display());
    }

    if let Some(path) = &args.speak {
        match (&response.audio, &response.speech_warning) {
            (Some(audio), _) => {
                fs::write(path, audio)
                    .with_context(|| format!("Failed to write audio to {}", path.display()))?;
                info!("Saved {} bytes of audio to {}", audio.len(), path.display());
            }
            (None, Some(warning)) => eprintln!("{}", warning),
            (None, None) => {}
        }
    }

    Ok(())
}
