//! Utility DSP functions
//!
//! Power-of-two sizing for the FFT path and the peak measurement shared by
//! convolution post-processing and the PCM encoder.

use crate::Sample;

/// Find the next power of two greater than or equal to n
pub fn next_power_of_two(n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let mut power = 1;
    while power < n {
        power *= 2;
    }
    power
}

/// Calculate peak amplitude of a buffer
pub fn calculate_peak(buffer: &[Sample]) -> Sample {
    buffer.iter().map(|&x| x.abs()).fold(0.0, Sample::max)
}

/// Peak used as a divisor: the buffer peak, but never below 1.0.
///
/// The floor keeps silent or already-quiet buffers from being divided by
/// zero or amplified.
pub fn normalization_peak(buffer: &[Sample]) -> Sample {
    calculate_peak(buffer).max(1.0)
}

/// Divide every sample by [`normalization_peak`].
pub fn peak_normalize(buffer: &mut [Sample]) {
    let peak = normalization_peak(buffer);
    if peak > 1.0 {
        for sample in buffer {
            *sample /= peak;
        }
    }
}
