//! Complex arithmetic
//!
//! Values are `num_complex::Complex64`, an immutable `(re, im)` pair of
//! 64-bit floats. The helpers here name the handful of operations the modem
//! leans on, so call sites read the same whether they come from `num-complex`
//! or from us.

pub use num_complex::Complex64 as Complex;

pub const ZERO: Complex = Complex::new(0.0, 0.0);
pub const ONE: Complex = Complex::new(1.0, 0.0);
pub const I: Complex = Complex::new(0.0, 1.0);

#[inline]
pub fn add(a: Complex, b: Complex) -> Complex {
    a + b
}

#[inline]
pub fn sub(a: Complex, b: Complex) -> Complex {
    a - b
}

#[inline]
pub fn mul(a: Complex, b: Complex) -> Complex {
    a * b
}

#[inline]
pub fn scale(a: Complex, v: f64) -> Complex {
    a.scale(v)
}

#[inline]
pub fn neg(a: Complex) -> Complex {
    -a
}

#[inline]
pub fn conj(a: Complex) -> Complex {
    a.conj()
}

/// Power, `r² + i²` (no square root)
#[inline]
pub fn mag(a: Complex) -> f64 {
    a.norm_sqr()
}

/// Euclidean magnitude
#[inline]
pub fn abs(a: Complex) -> f64 {
    a.re.hypot(a.im)
}

/// Angle in radians, `atan2(i, r)`
#[inline]
pub fn arg(a: Complex) -> f64 {
    a.im.atan2(a.re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn multiplication_rotates() {
        let rotated = mul(ONE, I);
        assert_eq!(rotated, I);
        assert_eq!(mul(I, I), neg(ONE));
    }

    #[test]
    fn magnitude_is_power_and_abs_is_length() {
        let z = Complex::new(3.0, 4.0);
        assert_eq!(mag(z), 25.0);
        assert_eq!(abs(z), 5.0);
        assert_eq!(conj(z), Complex::new(3.0, -4.0));
        assert_eq!(scale(z, 2.0), Complex::new(6.0, 8.0));
        assert_eq!(sub(add(z, ONE), ONE), z);
    }

    #[test]
    fn argument_of_imaginary_unit() {
        assert!((arg(I) - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(arg(ZERO), 0.0);
    }
}
