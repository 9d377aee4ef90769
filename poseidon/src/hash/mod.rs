//! The Poseidon permutation and its parameters.

pub mod grain;
pub mod matrix;
pub mod poseidon;
pub mod poseidon_bn254;
pub mod poseidon_sparse;
pub(crate) mod utils;
