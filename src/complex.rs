//! Complex arithmetic for the FFT engine
//!
//! Values are [`num_complex::Complex64`]. The product every butterfly and the
//! frequency-domain point-wise product go through is spelled out in
//! [`multiply`].

use num_complex::Complex64;

/// Complex sample used by the FFT engine.
pub type Complex = Complex64;

/// Complex product `a · b`.
///
/// `re = a.re·b.re − a.im·b.im`, `im = a.im·b.re + a.re·b.im`.
#[inline]
pub fn multiply(a: Complex, b: Complex) -> Complex {
    Complex::new(a.re * b.re - a.im * b.im, a.im * b.re + a.re * b.im)
}
