//! wavconvolve - apply an impulse response to a WAV recording
//!
//! Reads a dry 16-bit PCM recording and an impulse response, convolves them
//! and writes the normalized result as a new 16-bit PCM file.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use wavconvolve::{convolve, wav, ConvolutionConfig, ConvolutionMethod};

#[derive(Parser)]
#[command(name = "wavconvolve")]
#[command(about = "Convolve a WAV recording with an impulse response")]
#[command(version)]
struct Cli {
    /// Dry input recording (16-bit PCM WAV)
    input: PathBuf,

    /// Impulse response (16-bit PCM WAV)
    impulse_response: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Convolution strategy
    #[arg(short, long, value_enum, default_value_t = Method::Fft)]
    method: Method,

    /// Skip peak normalization of the convolved signal before encoding
    #[arg(long)]
    no_normalize: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Time-domain sum
    Direct,
    /// Recursive radix-2 FFT
    Fft,
    /// In-place iterative radix-2 FFT
    IterativeFft,
}

impl From<Method> for ConvolutionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Direct => ConvolutionMethod::Direct,
            Method::Fft => ConvolutionMethod::Fft,
            Method::IterativeFft => ConvolutionMethod::IterativeFft,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!("Reading wav file {:?}", cli.input);
    let input = wav::read_signal(&cli.input)
        .with_context(|| format!("Unable to open wav file: {}", cli.input.display()))?;

    tracing::info!("Reading IR file {:?}", cli.impulse_response);
    let impulse_response = wav::read_signal(&cli.impulse_response).with_context(|| {
        format!(
            "Unable to open IR file: {}",
            cli.impulse_response.display()
        )
    })?;

    tracing::info!(
        "Input: {} samples ({:.2}s), IR: {} samples ({:.2}s)",
        input.len(),
        input.duration_secs(),
        impulse_response.len(),
        impulse_response.duration_secs()
    );

    let config = ConvolutionConfig {
        method: cli.method.into(),
        normalize: !cli.no_normalize,
    };
    let output = convolve::convolve(&input, &impulse_response, &config)
        .context("Convolution failed")?;

    tracing::info!("Writing {} samples to {:?}", output.len(), cli.output);
    wav::write_signal(&output, &cli.output)
        .with_context(|| format!("Unable to write {}", cli.output.display()))?;

    tracing::info!("Finished");
    Ok(())
}
