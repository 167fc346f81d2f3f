//! Low-level utilities: numerical constants and symmetric-matrix helpers.

pub mod constants;
pub mod linalg;

pub use constants::*;
pub use linalg::{planes_match, sym_lower, symmetrize};
