//! Poseidon with sparse partial-round matrices.
//!
//! Each partial round multiplies by a matrix that is dense only in its first row and first
//! column, which costs `2 * width - 1` multiplications by constants instead of `width^2`. The
//! round before the partial rounds uses a modified dense matrix that absorbs the remaining
//! factor. Round constants are shared with the dense schedule, and both produce identical
//! outputs.

use alloc::vec::Vec;

use ark_ff::PrimeField;
use log::{debug, trace};

use crate::error::PoseidonError;
use crate::gates::arithmetic::Arithmetic;
use crate::hash::matrix::{transpose, Matrix};
use crate::hash::poseidon::{
    add_constants, add_first_constant, check_matrix, check_schedule, check_state,
    check_state_width, mix, mix_one, PermutationState, PoseidonConfig, PoseidonPermutation,
};
use crate::hash::utils::sparse_factorization;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparsePoseidonConfig<F> {
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
    round_constants: Vec<F>,
    mds: Matrix<F>,
    mix_rows: Matrix<F>,
    /// Replaces `mds` in the round preceding the partial rounds. Same storage convention.
    pre_sparse: Matrix<F>,
    pre_sparse_rows: Matrix<F>,
    /// `2 * width - 1` entries per partial round.
    sparse: Vec<F>,
}

impl<F: PrimeField> SparsePoseidonConfig<F> {
    /// Derives the sparse tables from a dense config.
    pub fn from_config(config: &PoseidonConfig<F>) -> Result<Self, PoseidonError> {
        let (pre_sparse_rows, sparse) =
            sparse_factorization(config.mix_rows(), config.partial_rounds())?;
        let sparse_config = Self::from_parts(
            config.width(),
            config.full_rounds(),
            config.partial_rounds(),
            config.round_constants().to_vec(),
            config.mds().to_vec(),
            transpose(&pre_sparse_rows),
            sparse,
        )?;
        debug!(
            "built sparse Poseidon config: width={}, partial_rounds={}",
            sparse_config.width, sparse_config.partial_rounds
        );
        Ok(sparse_config)
    }

    pub fn from_parts(
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
        round_constants: Vec<F>,
        mds: Matrix<F>,
        pre_sparse: Matrix<F>,
        sparse: Vec<F>,
    ) -> Result<Self, PoseidonError> {
        check_schedule(width, full_rounds, partial_rounds, &round_constants)?;
        check_matrix(&mds, width)?;
        check_matrix(&pre_sparse, width)?;
        // Bounded by the round table checked above.
        let expected = (2 * width - 1) * partial_rounds;
        if sparse.len() != expected {
            return Err(PoseidonError::SparseVectorCount {
                expected,
                actual: sparse.len(),
            });
        }

        Ok(Self {
            width,
            full_rounds,
            partial_rounds,
            round_constants,
            mix_rows: transpose(&mds),
            mds,
            pre_sparse_rows: transpose(&pre_sparse),
            pre_sparse,
            sparse,
        })
    }

    pub fn round_constants(&self) -> &[F] {
        &self.round_constants
    }

    pub fn mds(&self) -> &[Vec<F>] {
        &self.mds
    }

    pub fn pre_sparse(&self) -> &[Vec<F>] {
        &self.pre_sparse
    }

    pub fn sparse(&self) -> &[F] {
        &self.sparse
    }

    /// `state[i] += round_constants[offset + i]` for every position.
    pub fn add_round_constants<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
        offset: usize,
    ) -> Result<(), PoseidonError> {
        check_state_width(self.width, state.width())?;
        add_constants(api, state, &self.round_constants, offset)
    }

    /// `state[0] += round_constants[offset]`.
    pub fn add_partial_round_constant<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
        offset: usize,
    ) -> Result<(), PoseidonError> {
        check_state_width(self.width, state.width())?;
        add_first_constant(api, state, &self.round_constants, offset)
    }

    /// `state'[i] = sum_j mds[j][i] * state[j]`.
    pub fn full_mix<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
    ) -> Result<(), PoseidonError> {
        check_state_width(self.width, state.width())?;
        mix(api, state, &self.mix_rows);
        Ok(())
    }

    /// Coordinate `output_index` of [`Self::full_mix`], without touching the state.
    pub fn last_element_mix<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &PermutationState<A::Var>,
        output_index: usize,
    ) -> Result<A::Var, PoseidonError> {
        check_state_width(self.width, state.width())?;
        mix_one(api, state, &self.mix_rows, output_index)
    }

    /// The sparse matrix of partial round `round`:
    ///
    /// ```text
    /// state'[0] = sum_i sparse[o + i] * state[i]
    /// state'[i] = state[i] + state[0] * sparse[o + width + i - 1]    (i >= 1)
    /// ```
    ///
    /// with `o = (2 * width - 1) * round`.
    pub fn mix_partial<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
        round: usize,
    ) -> Result<(), PoseidonError> {
        check_state_width(self.width, state.width())?;
        let t = self.width;
        let len = 2 * t - 1;
        let entries = round
            .checked_mul(len)
            .and_then(|offset| self.sparse.get(offset..offset.checked_add(len)?))
            .ok_or(PoseidonError::SparseVectorCount {
                expected: round.saturating_add(1).saturating_mul(len),
                actual: self.sparse.len(),
            })?;

        let s0 = state.elements[0].clone();
        let first = api.linear_combination(&state.elements, &entries[..t]);
        for (x, &scale) in state.elements[1..].iter_mut().zip(&entries[t..]) {
            let scaled = api.mul_const(&s0, scale);
            *x = api.add(x, &scaled);
        }
        state.elements[0] = first;
        Ok(())
    }
}

impl<F: PrimeField> PoseidonPermutation<F> for SparsePoseidonConfig<F> {
    fn width(&self) -> usize {
        self.width
    }

    fn permute<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
        n_outputs: usize,
    ) -> Result<Vec<A::Var>, PoseidonError> {
        check_state(self.width, state.width(), n_outputs)?;
        trace!(
            "sparse poseidon permutation: width={}, outputs={}",
            self.width,
            n_outputs
        );

        let t = self.width;
        let half_full_rounds = self.full_rounds / 2;
        let partial_start = (half_full_rounds + 1) * t;

        self.add_round_constants(api, state, 0)?;
        for r in 0..half_full_rounds - 1 {
            state.apply_full_sbox(api);
            self.add_round_constants(api, state, (r + 1) * t)?;
            self.full_mix(api, state)?;
        }

        // The transition round absorbs the dense factor of every partial-round matrix.
        state.apply_full_sbox(api);
        self.add_round_constants(api, state, half_full_rounds * t)?;
        mix(api, state, &self.pre_sparse_rows);

        for r in 0..self.partial_rounds {
            state.apply_sbox(api, 0);
            self.add_partial_round_constant(api, state, partial_start + r)?;
            self.mix_partial(api, state, r)?;
        }

        for r in 0..half_full_rounds - 1 {
            state.apply_full_sbox(api);
            self.add_round_constants(api, state, partial_start + self.partial_rounds + r * t)?;
            self.full_mix(api, state)?;
        }

        state.apply_full_sbox(api);
        (0..n_outputs)
            .map(|i| self.last_element_mix(api, state, i))
            .collect()
    }
}
