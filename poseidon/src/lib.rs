//! Poseidon hashing over prime fields with an `x^5` S-box.
//!
//! The permutation is written once against the [`Arithmetic`](gates::arithmetic::Arithmetic)
//! interface, so the same code evaluates natively over field elements and records add/multiply
//! constraints through a [`CircuitBuilder`](gates::builder::CircuitBuilder). Two round strategies
//! are provided: [`PoseidonConfig`](hash::poseidon::PoseidonConfig) with dense mixing in every
//! round, and [`SparsePoseidonConfig`](hash::poseidon_sparse::SparsePoseidonConfig), which uses
//! sparse matrices in the partial rounds and produces the same outputs.
//!
//! ```
//! use ark_bn254::Fr;
//! use poseidon_circuits::hash::poseidon_bn254::poseidon_hash;
//!
//! let digest = poseidon_hash(&[Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)]).unwrap();
//! assert_ne!(digest, Fr::from(0u64));
//! ```

#![allow(clippy::needless_range_loop)]

extern crate alloc;

pub mod error;
pub mod gates;
pub mod hash;
