//! Poseidon over the BN254 scalar field, for every supported width.
//!
//! Parameters are generated on first use and cached for the lifetime of the process.

use std::sync::OnceLock;

use ark_bn254::Fr;

use crate::error::PoseidonError;
use crate::hash::poseidon::{hash, PoseidonConfig, MAX_WIDTH, MIN_WIDTH};
use crate::hash::poseidon_sparse::SparsePoseidonConfig;

const NUM_WIDTHS: usize = MAX_WIDTH - MIN_WIDTH + 1;

type Cached<T> = OnceLock<Result<T, PoseidonError>>;

#[allow(clippy::declare_interior_mutable_const)]
const UNINIT_CONFIG: Cached<PoseidonConfig<Fr>> = OnceLock::new();
#[allow(clippy::declare_interior_mutable_const)]
const UNINIT_SPARSE: Cached<SparsePoseidonConfig<Fr>> = OnceLock::new();

static CONFIGS: [Cached<PoseidonConfig<Fr>>; NUM_WIDTHS] = [UNINIT_CONFIG; NUM_WIDTHS];
static SPARSE_CONFIGS: [Cached<SparsePoseidonConfig<Fr>>; NUM_WIDTHS] = [UNINIT_SPARSE; NUM_WIDTHS];

fn slot(width: usize) -> Result<usize, PoseidonError> {
    if (MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        Ok(width - MIN_WIDTH)
    } else {
        Err(PoseidonError::UnsupportedWidth(width))
    }
}

/// The dense-schedule parameters for `width`.
pub fn config(width: usize) -> Result<&'static PoseidonConfig<Fr>, PoseidonError> {
    CONFIGS[slot(width)?]
        .get_or_init(|| PoseidonConfig::new(width))
        .as_ref()
        .map_err(Clone::clone)
}

/// The sparse-schedule parameters for `width`, derived from [`config`].
pub fn sparse_config(width: usize) -> Result<&'static SparsePoseidonConfig<Fr>, PoseidonError> {
    SPARSE_CONFIGS[slot(width)?]
        .get_or_init(|| config(width).and_then(SparsePoseidonConfig::from_config))
        .as_ref()
        .map_err(Clone::clone)
}

/// Hashes between 1 and `MAX_WIDTH - 1` field elements with the width `inputs.len() + 1`.
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, PoseidonError> {
    hash(config(inputs.len() + 1)?, inputs)
}

/// [`poseidon_hash`] using the sparse partial rounds.
pub fn poseidon_hash_sparse(inputs: &[Fr]) -> Result<Fr, PoseidonError> {
    hash(sparse_config(inputs.len() + 1)?, inputs)
}
