//! Radix-2 Cooley-Tukey FFT
//!
//! Forward and inverse discrete Fourier transforms over complex sequences
//! whose length is a power of two. The forward transform uses the positive
//! exponent `e^{+i·2πk/n}`; the inverse uses the negative one and halves every
//! butterfly output, which over `log2(n)` levels gives the `1/n` scale.

use crate::{complex::multiply, AudioError, AudioResult, Complex, Sample};
use core::f64::consts::TAU;
use tracing::trace;

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Time domain to frequency domain.
    Forward,
    /// Frequency domain to time domain, scaled by `1/n`.
    Inverse,
}

impl Direction {
    /// `+1.0` for [`Forward`](Self::Forward), `-1.0` for [`Inverse`](Self::Inverse).
    pub fn sign(self) -> Sample {
        match self {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        }
    }
}

/// Transform a sequence recursively, returning a new sequence.
///
/// # Errors
/// Returns [`AudioError::InvalidFftLength`] when the length is not a power
/// of two.
///
/// # Example
///
/// ```rust
/// use wavconvolve::{fft, Complex};
///
/// let signal = vec![
///     Complex::new(1.0, 0.0),
///     Complex::default(),
///     Complex::default(),
///     Complex::default(),
/// ];
/// let spectrum = fft::transform(&signal, fft::Direction::Forward).unwrap();
/// assert!(spectrum.iter().all(|bin| *bin == Complex::new(1.0, 0.0)));
/// ```
pub fn transform(sequence: &[Complex], direction: Direction) -> AudioResult<Vec<Complex>> {
    check_length(sequence.len())?;
    trace!(n = sequence.len(), ?direction, "recursive fft");
    Ok(transform_recursive(sequence, direction))
}

fn transform_recursive(sequence: &[Complex], direction: Direction) -> Vec<Complex> {
    let n = sequence.len();
    if n == 1 {
        return sequence.to_vec();
    }

    let even: Vec<Complex> = sequence.iter().step_by(2).copied().collect();
    let odd: Vec<Complex> = sequence.iter().skip(1).step_by(2).copied().collect();
    let even = transform_recursive(&even, direction);
    let odd = transform_recursive(&odd, direction);

    let half = n / 2;
    let root = Complex::from_polar(1.0, direction.sign() * TAU / n as Sample);
    let mut omega = Complex::new(1.0, 0.0);
    let mut output = vec![Complex::default(); n];

    for i in 0..half {
        let t = multiply(omega, odd[i]);
        let (low, high) = butterfly(even[i], t, direction);
        output[i] = low;
        output[i + half] = high;
        omega = multiply(omega, root);
    }

    output
}

/// Transform a buffer in place with the iterative butterfly network.
///
/// Produces the same values as [`transform`] (up to rounding) without
/// allocating per recursion level.
///
/// # Errors
/// Returns [`AudioError::InvalidFftLength`] when the length is not a power
/// of two.
pub fn transform_in_place(buffer: &mut [Complex], direction: Direction) -> AudioResult<()> {
    let n = buffer.len();
    check_length(n)?;
    trace!(n, ?direction, "iterative fft");
    if n == 1 {
        return Ok(());
    }

    // Bit-reversal permutation
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if i < j {
            buffer.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let root = Complex::from_polar(1.0, direction.sign() * TAU / len as Sample);

        for start in (0..n).step_by(len) {
            let mut omega = Complex::new(1.0, 0.0);
            for k in start..start + half {
                let t = multiply(omega, buffer[k + half]);
                let (low, high) = butterfly(buffer[k], t, direction);
                buffer[k] = low;
                buffer[k + half] = high;
                omega = multiply(omega, root);
            }
        }

        len <<= 1;
    }

    Ok(())
}

#[inline]
fn butterfly(even: Complex, t: Complex, direction: Direction) -> (Complex, Complex) {
    let low = even + t;
    let high = even - t;
    match direction {
        Direction::Forward => (low, high),
        Direction::Inverse => (low * 0.5, high * 0.5),
    }
}

fn check_length(n: usize) -> AudioResult<()> {
    if n.is_power_of_two() {
        Ok(())
    } else {
        Err(AudioError::InvalidFftLength(n))
    }
}
