// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snapguard::config::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};
use snapguard::{
    ClassificationResult, ClassifierConfig, FileImage, GlobalLogger, ImageSource, Label,
    NetworkImage, SensitiveContentClassifier,
};

#[derive(Parser)]
#[command(name = "snapguard")]
#[command(about = "Classify text and images as sensitive using Google Gemini", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify text, an image, or both
    Classify {
        /// Text to classify
        #[arg(long, short = 't', default_value = "")]
        text: String,

        /// Image file path or http(s) URL
        #[arg(long, short = 'i')]
        image: Option<String>,

        /// Send the image bytes (file or URL) as-is instead of decoding and re-encoding
        #[arg(long)]
        raw: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Gemini model name
        #[arg(long, short = 'm', env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Override the Gemini API base URL
        #[arg(long, env = "GEMINI_BASE_URL")]
        base_url: Option<String>,

        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,

        #[arg(long, default_value_t = DEFAULT_TOP_P)]
        top_p: f32,

        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: u32,

        #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
        max_output_tokens: u32,

        /// Give up on the request after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List the labels the model chooses from
    Labels,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            text,
            image,
            raw,
            json,
            api_key,
            model,
            base_url,
            temperature,
            top_p,
            top_k,
            max_output_tokens,
            timeout_secs,
        } => {
            let mut config = ClassifierConfig::new(api_key)
                .with_model(model)
                .with_temperature(temperature)
                .with_top_p(top_p)
                .with_top_k(top_k)
                .with_max_output_tokens(max_output_tokens);
            if let Some(url) = base_url {
                config = config.with_base_url(url);
            }
            if let Some(secs) = timeout_secs {
                config = config.with_request_timeout(Duration::from_secs(secs));
            }

            run_classify(config, text, image, raw, json).await
        }
        Commands::Labels => {
            list_labels();
            Ok(())
        }
    }
}

async fn image_source(image: &str, raw: bool) -> Result<ImageSource> {
    let is_url = image.starts_with("http://") || image.starts_with("https://");
    if is_url {
        if raw {
            info!("Fetching raw image bytes from {}", image);
            let bytes = reqwest::get(image)
                .await
                .and_then(|response| response.error_for_status())
                .with_context(|| format!("Failed to fetch {}", image))?
                .bytes()
                .await
                .with_context(|| format!("Failed to read body of {}", image))?;
            return Ok(ImageSource::Bytes(bytes.to_vec()));
        }
        return Ok(ImageSource::Lazy(Arc::new(NetworkImage::new(image))));
    }

    let path = PathBuf::from(image);
    if raw {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(ImageSource::Bytes(bytes))
    } else {
        Ok(ImageSource::Lazy(Arc::new(FileImage::new(path))))
    }
}

async fn run_classify(
    config: ClassifierConfig,
    text: String,
    image: Option<String>,
    raw: bool,
    json: bool,
) -> Result<()> {
    info!("Using model {} at {}", config.model(), config.base_url());

    let classifier = SensitiveContentClassifier::new(config, Arc::new(GlobalLogger))?;

    let source = match &image {
        Some(image) => Some(image_source(image, raw).await?),
        None => None,
    };

    match classifier.try_classify_source(source, &text).await {
        Ok(Some(result)) => {
            print_result(&result, json);
            Ok(())
        }
        Ok(None) => {
            println!("The model returned no classification.");
            Ok(())
        }
        Err(e) => {
            error!("Classification failed: {}", e);
            if e.is_retryable() {
                println!("\nThis looks temporary. Try again in a moment.");
            }
            Err(e.into())
        }
    }
}

fn print_result(result: &ClassificationResult, json: bool) {
    if json {
        println!("{}", result.to_json());
        return;
    }

    println!("\n=== Classification ===");
    println!("Image:     {}", result.image_classification());
    println!("Text:      {}", result.text_classification());
    println!("Sensitive: {}", if result.is_sensitive() { "yes" } else { "no" });
    if !result.flag_matches_labels() {
        println!("Note: the sensitivity flag does not match the labels above");
    }
    println!("======================\n");
}

fn list_labels() {
    println!("\nLabels:");
    for label in Label::ALL {
        let kind = if label.is_sensitive() { "sensitive" } else { "safe" };
        println!("  - {} ({})", label, kind);
    }
    println!();
}
