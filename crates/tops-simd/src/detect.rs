//! Vector instruction set the crate was built for.

use std::fmt;

/// Available SIMD instruction sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdLevel {
    /// No SIMD, use scalar code.
    Scalar,
    /// SSE2 (128-bit, available on all x86-64).
    Sse2,
    /// AVX (256-bit float).
    Avx,
    /// AVX2 with FMA (256-bit integer + fused multiply-add).
    Avx2,
    /// AVX-512 (512-bit).
    Avx512,
    /// ARM NEON (128-bit).
    Neon,
}

impl SimdLevel {
    /// The level `wide` was compiled against.
    ///
    /// Read from the enabled target features, so it is fixed for the whole
    /// binary. Build with `-C target-cpu=native` to raise it.
    pub const fn compiled() -> Self {
        if cfg!(target_feature = "avx512f") {
            SimdLevel::Avx512
        } else if cfg!(all(target_feature = "avx2", target_feature = "fma")) {
            SimdLevel::Avx2
        } else if cfg!(target_feature = "avx") {
            SimdLevel::Avx
        } else if cfg!(target_feature = "sse2") {
            SimdLevel::Sse2
        } else if cfg!(target_feature = "neon") {
            SimdLevel::Neon
        } else {
            SimdLevel::Scalar
        }
    }

    /// SIMD width in bytes.
    pub const fn width_bytes(&self) -> usize {
        match self {
            SimdLevel::Scalar => 1,
            SimdLevel::Sse2 | SimdLevel::Neon => 16,
            SimdLevel::Avx | SimdLevel::Avx2 => 32,
            SimdLevel::Avx512 => 64,
        }
    }

    /// Number of f32 elements that fit in one SIMD register.
    pub const fn f32_width(&self) -> usize {
        self.width_bytes() / 4
    }

    /// Number of f64 elements that fit in one SIMD register.
    pub const fn f64_width(&self) -> usize {
        self.width_bytes() / 8
    }

    /// Whether vector `mul_add` lowers to a fused instruction.
    pub const fn fused_multiply_add(&self) -> bool {
        matches!(self, SimdLevel::Avx2 | SimdLevel::Avx512 | SimdLevel::Neon)
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Sse2 => "sse2",
            SimdLevel::Avx => "avx",
            SimdLevel::Avx2 => "avx2+fma",
            SimdLevel::Avx512 => "avx512",
            SimdLevel::Neon => "neon",
        };
        f.write_str(name)
    }
}

/// The SIMD level of this build.
pub const fn simd_level() -> SimdLevel {
    SimdLevel::compiled()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled() {
        let level = SimdLevel::compiled();
        println!("Compiled SIMD level: {}", level);

        #[cfg(target_arch = "x86_64")]
        assert!(level >= SimdLevel::Sse2);

        #[cfg(target_arch = "aarch64")]
        assert_eq!(level, SimdLevel::Neon);

        assert_eq!(simd_level(), level);
    }

    #[test]
    fn test_width() {
        assert_eq!(SimdLevel::Avx2.f32_width(), 8);
        assert_eq!(SimdLevel::Avx2.f64_width(), 4);
        assert_eq!(SimdLevel::Sse2.f32_width(), 4);
        assert_eq!(SimdLevel::Scalar.f64_width(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimdLevel::Avx2.to_string(), "avx2+fma");
        assert!(!SimdLevel::Sse2.fused_multiply_add());
    }
}
