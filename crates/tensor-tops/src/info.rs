//! Build information for `tops info`.

use crate::registry::variants;
use tops_simd::{simd_level, BinaryDispatch, Dispatch};
use tops_types::{And, Bf16, Precision, Tf32, Xor, B1, F16, F32, F64, S32, S4, S8, U4, U8};

fn dense<I: Dispatch<O>, O: Precision>() -> (String, &'static str) {
    (format!("{}{}", I::NAME, O::NAME), I::BACKEND)
}

/// Host primitive each precision pairing dispatches to, as
/// `(pairing, primitive)`.
pub fn host_primitives() -> Vec<(String, &'static str)> {
    vec![
        dense::<F16, F16>(),
        dense::<F16, F32>(),
        dense::<Bf16, F32>(),
        dense::<Tf32, F32>(),
        dense::<F64, F64>(),
        dense::<U8, S32>(),
        dense::<S8, S32>(),
        dense::<U4, S32>(),
        dense::<S4, S32>(),
        ("b1i32xor".to_string(), <B1 as BinaryDispatch<Xor>>::BACKEND),
        ("b1i32and".to_string(), <B1 as BinaryDispatch<And>>::BACKEND),
    ]
}

/// Get information about the library configuration.
pub fn version_info() -> String {
    let level = simd_level();
    let mut info = format!(
        "tensor-tops v{}\nSIMD Level: {} ({} f32 lanes)\nParallel groups: {}\nVariants: {}\nHost primitives:",
        env!("CARGO_PKG_VERSION"),
        level,
        level.f32_width().max(1),
        cfg!(feature = "parallel"),
        variants().len()
    );
    for (pairing, primitive) in host_primitives() {
        info.push_str(&format!("\n  {:<10} {}", pairing, primitive));
    }
    info
}
