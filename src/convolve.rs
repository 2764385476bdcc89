//! Linear convolution of a dry signal with an impulse response
//!
//! Two strategies produce the same result up to rounding:
//! [`convolve_direct`] sums products in the time domain, and
//! [`convolve_fft`] multiplies spectra after zero-padding both operands to a
//! power of two that covers the whole `n + m - 1` output, so the circular
//! convolution computed by the FFT never wraps the tail into the head.

use crate::{
    complex::multiply,
    fft::{self, Direction},
    utils::{next_power_of_two, peak_normalize},
    AudioBuffer, AudioError, AudioResult, Complex, Sample, Signal,
};
use tracing::{debug, info};

/// Convolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolutionMethod {
    /// Time-domain sum, `O(n·m)`.
    Direct,
    /// Frequency-domain product with the recursive FFT.
    #[default]
    Fft,
    /// Frequency-domain product with the in-place iterative FFT.
    IterativeFft,
}

/// Configuration for [`convolve`]
///
/// # Example
///
/// ```rust
/// use wavconvolve::{convolve, Signal};
///
/// let dry = Signal::mono(vec![1.0, 2.0, 3.0]);
/// let ir = Signal::mono(vec![1.0, 1.0]);
/// let config = convolve::ConvolutionConfig {
///     method: convolve::ConvolutionMethod::Direct,
///     normalize: false,
/// };
/// let wet = convolve::convolve(&dry, &ir, &config).unwrap();
/// assert_eq!(wet.samples(), &[1.0, 3.0, 5.0, 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ConvolutionConfig {
    /// Which strategy computes the convolution.
    pub method: ConvolutionMethod,
    /// Divide the result by its peak (when the peak exceeds 1.0).
    pub normalize: bool,
}

impl Default for ConvolutionConfig {
    fn default() -> Self {
        Self {
            method: ConvolutionMethod::Fft,
            normalize: true,
        }
    }
}

/// Apply an impulse response with the default configuration
///
/// FFT convolution followed by peak normalization.
pub fn apply_ir(input: &Signal, impulse_response: &Signal) -> AudioResult<Signal> {
    convolve(input, impulse_response, &ConvolutionConfig::default())
}

/// Convolve two signals with the configured strategy
///
/// The result keeps the input's channel count and sample rate and has
/// `input.len() + impulse_response.len() - 1` samples.
pub fn convolve(
    input: &Signal,
    impulse_response: &Signal,
    config: &ConvolutionConfig,
) -> AudioResult<Signal> {
    info!(
        method = ?config.method,
        input = input.len(),
        impulse_response = impulse_response.len(),
        "convolving"
    );

    let (input_samples, ir_samples) = (input.samples(), impulse_response.samples());
    let mut output = match config.method {
        ConvolutionMethod::Direct => convolve_direct(input_samples, ir_samples)?,
        ConvolutionMethod::Fft => convolve_fft(input_samples, ir_samples)?,
        ConvolutionMethod::IterativeFft => convolve_fft_iterative(input_samples, ir_samples)?,
    };

    if config.normalize {
        peak_normalize(&mut output);
    }

    Ok(Signal::new(output, input.channels(), input.sample_rate()))
}

/// Time-domain convolution
///
/// The reference result: `output[i + j] += impulse_response[i] · input[j]`.
///
/// # Example
///
/// ```rust
/// use wavconvolve::convolve;
///
/// let result = convolve::convolve_direct(&[1.0, 2.0, 3.0], &[1.0, 1.0]).unwrap();
/// assert_eq!(result, vec![1.0, 3.0, 5.0, 3.0]);
/// ```
pub fn convolve_direct(input: &[Sample], impulse_response: &[Sample]) -> AudioResult<AudioBuffer> {
    let output_length = linear_length(input, impulse_response)?;
    let mut output = vec![0.0; output_length];

    for (i, &ir_sample) in impulse_response.iter().enumerate() {
        for (j, &input_sample) in input.iter().enumerate() {
            output[i + j] += ir_sample * input_sample;
        }
    }

    Ok(output)
}

/// FFT-based convolution with the recursive transform
///
/// # Example
///
/// ```rust
/// use wavconvolve::convolve;
///
/// let result = convolve::convolve_fft(&[1.0, 2.0, 3.0], &[1.0, 1.0]).unwrap();
/// assert_eq!(result.len(), 4);
/// assert!((result[2] - 5.0).abs() < 1e-9);
/// ```
pub fn convolve_fft(input: &[Sample], impulse_response: &[Sample]) -> AudioResult<AudioBuffer> {
    let output_length = linear_length(input, impulse_response)?;
    let size = fft_size(input.len(), impulse_response.len());
    debug!(output_length, fft_size = size, "recursive fft convolution");

    let input_spectrum = fft::transform(&pad_complex(input, size), Direction::Forward)?;
    let ir_spectrum = fft::transform(&pad_complex(impulse_response, size), Direction::Forward)?;

    let product: Vec<Complex> = input_spectrum
        .iter()
        .zip(&ir_spectrum)
        .map(|(&a, &b)| multiply(a, b))
        .collect();

    let time = fft::transform(&product, Direction::Inverse)?;
    Ok(real_part(&time, output_length))
}

/// FFT-based convolution with the in-place iterative transform
pub fn convolve_fft_iterative(
    input: &[Sample],
    impulse_response: &[Sample],
) -> AudioResult<AudioBuffer> {
    let output_length = linear_length(input, impulse_response)?;
    let size = fft_size(input.len(), impulse_response.len());
    debug!(output_length, fft_size = size, "iterative fft convolution");

    let mut input_spectrum = pad_complex(input, size);
    let mut ir_spectrum = pad_complex(impulse_response, size);
    fft::transform_in_place(&mut input_spectrum, Direction::Forward)?;
    fft::transform_in_place(&mut ir_spectrum, Direction::Forward)?;

    for (a, &b) in input_spectrum.iter_mut().zip(&ir_spectrum) {
        *a = multiply(*a, b);
    }

    fft::transform_in_place(&mut input_spectrum, Direction::Inverse)?;
    Ok(real_part(&input_spectrum, output_length))
}

/// FFT length used for a pair of operand lengths
///
/// Smallest power of two that holds the full linear convolution
/// (`input_len + ir_len - 1`).
pub fn fft_size(input_len: usize, ir_len: usize) -> usize {
    next_power_of_two((input_len + ir_len).saturating_sub(1))
}

fn linear_length(input: &[Sample], impulse_response: &[Sample]) -> AudioResult<usize> {
    if input.is_empty() || impulse_response.is_empty() {
        return Err(AudioError::InsufficientData);
    }
    Ok(input.len() + impulse_response.len() - 1)
}

fn pad_complex(signal: &[Sample], size: usize) -> Vec<Complex> {
    signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(core::iter::repeat(Complex::default()))
        .take(size)
        .collect()
}

fn real_part(sequence: &[Complex], length: usize) -> AudioBuffer {
    sequence.iter().take(length).map(|c| c.re).collect()
}
