//! Canonical Poseidon parameter generation.
//!
//! Round constants and the Cauchy MDS matrix are drawn from the self-shrinking Grain LFSR
//! described in Appendix F of <https://eprint.iacr.org/2019/458.pdf>, seeded with the field
//! size, the state width and the round counts. This is the procedure behind the published
//! `x^5` parameter sets over 254-bit fields, so a permutation built from these values agrees
//! with other implementations of the same instance.

use alloc::vec::Vec;

use ark_ff::{BigInteger, PrimeField};
use itertools::Itertools;
use log::debug;

use crate::hash::matrix::Matrix;

const STATE_BITS: usize = 80;
const WARMUP_CLOCKS: usize = 160;

/// Field type tag for prime fields.
const FIELD_PRIME: u64 = 1;
/// S-box type tag for `x^alpha`.
const SBOX_POWER: u64 = 0;

/// An 80-bit Grain shift register, where bit `i` of `state` is register cell `i`.
#[derive(Clone, Debug)]
pub(crate) struct GrainLfsr {
    state: u128,
}

impl GrainLfsr {
    pub(crate) fn new(
        field_bits: usize,
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
    ) -> Self {
        let fields: [(u64, usize); 7] = [
            (FIELD_PRIME, 2),
            (SBOX_POWER, 4),
            (field_bits as u64, 12),
            (width as u64, 12),
            (full_rounds as u64, 10),
            (partial_rounds as u64, 10),
            ((1 << 30) - 1, 30),
        ];

        let mut state = 0u128;
        let mut cell = 0;
        for (value, len) in fields {
            for i in (0..len).rev() {
                state |= u128::from((value >> i) & 1) << cell;
                cell += 1;
            }
        }
        debug_assert_eq!(cell, STATE_BITS);

        let mut lfsr = Self { state };
        for _ in 0..WARMUP_CLOCKS {
            lfsr.clock();
        }
        lfsr
    }

    fn clock(&mut self) -> bool {
        let s = self.state;
        let new_bit = (s >> 62) ^ (s >> 51) ^ (s >> 38) ^ (s >> 23) ^ (s >> 13) ^ s;
        let new_bit = new_bit & 1;
        self.state = (s >> 1) | (new_bit << (STATE_BITS - 1));
        new_bit == 1
    }

    /// Self-shrinking output: bits come in pairs, and the second bit is kept only when the
    /// first one is set.
    fn next_bit(&mut self) -> bool {
        loop {
            let keep = self.clock();
            let bit = self.clock();
            if keep {
                return bit;
            }
        }
    }

    /// `n` output bits, most significant first.
    fn next_bits(&mut self, n: usize) -> Vec<bool> {
        (0..n).map(|_| self.next_bit()).collect()
    }

    /// A uniformly random field element, rejecting samples that are not below the modulus.
    pub(crate) fn next_field_element<F: PrimeField>(&mut self) -> F {
        loop {
            let bits = self.next_bits(F::MODULUS_BIT_SIZE as usize);
            if let Some(element) = F::from_bigint(F::BigInt::from_bits_be(&bits)) {
                return element;
            }
        }
    }

    /// A field element taken from the next `MODULUS_BIT_SIZE` bits, reduced modulo `p`.
    pub(crate) fn next_field_element_reduced<F: PrimeField>(&mut self) -> F {
        let bits = self.next_bits(F::MODULUS_BIT_SIZE as usize);
        F::from_be_bytes_mod_order(&F::BigInt::from_bits_be(&bits).to_bytes_be())
    }
}

/// Round constants and MDS matrix of the textbook ("Hades") Poseidon round structure:
/// every round adds `round_constants[r]`, applies the S-box, then multiplies by `mds`.
#[derive(Clone, Debug)]
pub struct HadesParameters<F> {
    pub round_constants: Vec<Vec<F>>,
    /// Applied as `state' = mds * state`.
    pub mds: Matrix<F>,
}

/// Generates the canonical parameters for the given width and round counts.
pub fn generate_parameters<F: PrimeField>(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> HadesParameters<F> {
    let mut grain = GrainLfsr::new(
        F::MODULUS_BIT_SIZE as usize,
        width,
        full_rounds,
        partial_rounds,
    );

    let round_constants = (0..full_rounds + partial_rounds)
        .map(|_| {
            (0..width)
                .map(|_| grain.next_field_element())
                .collect::<Vec<F>>()
        })
        .collect();
    let mds = cauchy_matrix(&mut grain, width);

    debug!(
        "generated Poseidon parameters: width={}, full_rounds={}, partial_rounds={}",
        width, full_rounds, partial_rounds
    );
    HadesParameters {
        round_constants,
        mds,
    }
}

/// `M[i][j] = 1 / (x_i + y_j)` for `2 * width` pairwise distinct samples `x || y`.
fn cauchy_matrix<F: PrimeField>(grain: &mut GrainLfsr, width: usize) -> Matrix<F> {
    loop {
        let samples: Vec<F> = (0..2 * width)
            .map(|_| grain.next_field_element_reduced())
            .collect();
        let distinct = samples.iter().tuple_combinations().all(|(a, b)| a != b);
        if !distinct {
            continue;
        }

        let (xs, ys) = samples.split_at(width);
        let matrix: Option<Matrix<F>> = xs
            .iter()
            .map(|&x| ys.iter().map(|&y| (x + y).inverse()).collect::<Option<Vec<F>>>())
            .collect();
        if let Some(matrix) = matrix {
            return matrix;
        }
    }
}
