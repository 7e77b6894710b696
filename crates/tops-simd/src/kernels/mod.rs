//! Host primitive implementations.

mod vector;

pub use vector::{WideMma, WidenF32};
