#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![doc = include_str!("../README.md")]

pub mod complex;
pub mod convolve;
pub mod fft;
pub mod utils;
pub mod wav;

pub use complex::*;
pub use convolve::*;
pub use fft::*;
pub use utils::*;
pub use wav::*;

use std::path::PathBuf;

/// Audio sample type (64-bit float).
///
/// Decoded samples keep their raw 16-bit integer magnitude; values only
/// return to the `[-1, 1]` range right before quantization.
pub type Sample = f64;

/// Buffer of audio samples.
pub type AudioBuffer = Vec<Sample>;

/// Sample rate every file is read and written at, in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// Single-channel audio signal.
///
/// A `Signal` is never modified once built; processing always returns a
/// new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: AudioBuffer,
    channels: u16,
    sample_rate: u32,
}

impl Signal {
    /// Create a signal with an explicit channel count and sample rate.
    pub fn new(samples: AudioBuffer, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Create a mono signal at [`SAMPLE_RATE`].
    pub fn mono(samples: AudioBuffer) -> Self {
        Self::new(samples, 1, SAMPLE_RATE)
    }

    /// Sample values.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Consume the signal and return its samples.
    pub fn into_samples(self) -> AudioBuffer {
        self.samples
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the signal has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Audio processing errors.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// A file could not be opened for reading.
    #[error("unable to open {}: {source}", .path.display())]
    FileNotFound {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Reading an opened file failed.
    #[error("unable to read {}: {source}", .path.display())]
    ReadFailure {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A file ended before the bytes its header promised.
    #[error("{}: expected {expected} bytes, found {actual}", .path.display())]
    TruncatedRead {
        /// File being read.
        path: PathBuf,
        /// Bytes requested.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
    /// A file could not be created or written.
    #[error("unable to write {}: {source}", .path.display())]
    WriteFailure {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A WAV header holds values the sample-count rule cannot use.
    #[error("{}: invalid WAV header: {reason}", .path.display())]
    InvalidHeader {
        /// File being read.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
    /// Not enough data provided for the requested operation.
    #[error("Insufficient data")]
    InsufficientData,
    /// FFT input length is not a power of two.
    #[error("FFT length {0} is not a power of two")]
    InvalidFftLength(usize),
}

/// Result type for audio processing operations
pub type AudioResult<T> = Result<T, AudioError>;
