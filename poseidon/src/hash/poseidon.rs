//! Implementation of the Poseidon permutation with an `x^5` S-box, as described in
//! <https://eprint.iacr.org/2019/458.pdf>.
//!
//! Round constants are stored in the compressed layout consumed by the schedule below: a full
//! vector before the first round and after the S-box of every full round, and a single constant
//! for `state[0]` in each partial round. See [`utils::compress_round_constants`] for how this
//! layout is derived from the canonical per-round constants.
//!
//! [`utils::compress_round_constants`]: crate::hash::utils::compress_round_constants

use alloc::vec::Vec;

use ark_ff::PrimeField;
use log::{debug, trace};
use static_assertions::const_assert_eq;

use crate::error::PoseidonError;
use crate::gates::arithmetic::{Arithmetic, NativeArithmetic};
use crate::hash::grain::{generate_parameters, HadesParameters};
use crate::hash::matrix::{transpose, Matrix};
use crate::hash::utils::compress_round_constants;

// NB: The partial round counts below are only secure for 254-bit fields with the x^5 S-box.
pub const FULL_ROUNDS: usize = 8;
pub const MIN_WIDTH: usize = 2;
pub const MAX_WIDTH: usize = 17;

/// Partial rounds per width `MIN_WIDTH..=MAX_WIDTH`, from tables 2 and 8 of the paper.
#[rustfmt::skip]
pub const PARTIAL_ROUNDS: [usize; MAX_WIDTH - MIN_WIDTH + 1] = [
    56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68,
];

const_assert_eq!(FULL_ROUNDS % 2, 0);
const_assert_eq!(PARTIAL_ROUNDS.len(), 16);

/// Number of partial rounds for a state of `width` elements.
pub fn partial_rounds(width: usize) -> Result<usize, PoseidonError> {
    if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        return Err(PoseidonError::UnsupportedWidth(width));
    }
    Ok(PARTIAL_ROUNDS[width - MIN_WIDTH])
}

/// Number of round constants the schedule consumes, or `None` on overflow.
pub const fn num_round_constants(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> Option<usize> {
    match width.checked_mul(full_rounds) {
        Some(n) => n.checked_add(partial_rounds),
        None => None,
    }
}

/// The evolving permutation state: the capacity element followed by the inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationState<V> {
    pub(crate) elements: Vec<V>,
}

impl<V: Clone> PermutationState<V> {
    pub fn new(capacity: V, inputs: &[V]) -> Self {
        let mut elements = Vec::with_capacity(inputs.len() + 1);
        elements.push(capacity);
        elements.extend_from_slice(inputs);
        Self { elements }
    }

    pub fn width(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[V] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<V> {
        self.elements
    }

    /// Applies the S-box to position `i`.
    pub(crate) fn apply_sbox<F: PrimeField, A: Arithmetic<F, Var = V>>(&mut self, api: &mut A, i: usize) {
        self.elements[i] = sbox(api, &self.elements[i]);
    }

    /// Applies the S-box to every position.
    pub(crate) fn apply_full_sbox<F: PrimeField, A: Arithmetic<F, Var = V>>(&mut self, api: &mut A) {
        for x in self.elements.iter_mut() {
            *x = sbox(api, x);
        }
    }
}

/// `x |--> x^5`, as three multiplications.
#[inline]
pub fn sbox<F: PrimeField, A: Arithmetic<F>>(api: &mut A, x: &A::Var) -> A::Var {
    let x2 = api.mul(x, x);
    let x4 = api.mul(&x2, &x2);
    api.mul(&x4, x)
}

/// `state[i] += constants[offset + i]` for every position.
pub(crate) fn add_constants<F: PrimeField, A: Arithmetic<F>>(
    api: &mut A,
    state: &mut PermutationState<A::Var>,
    constants: &[F],
    offset: usize,
) -> Result<(), PoseidonError> {
    let width = state.width();
    let round_constants = offset
        .checked_add(width)
        .and_then(|end| constants.get(offset..end))
        .ok_or(PoseidonError::RoundConstantCount {
            expected: offset.saturating_add(width),
            actual: constants.len(),
        })?;
    for (x, &c) in state.elements.iter_mut().zip(round_constants) {
        *x = api.add_const(x, c);
    }
    Ok(())
}

/// `state[0] += constants[offset]`.
pub(crate) fn add_first_constant<F: PrimeField, A: Arithmetic<F>>(
    api: &mut A,
    state: &mut PermutationState<A::Var>,
    constants: &[F],
    offset: usize,
) -> Result<(), PoseidonError> {
    let &c = constants
        .get(offset)
        .ok_or(PoseidonError::RoundConstantCount {
            expected: offset.saturating_add(1),
            actual: constants.len(),
        })?;
    state.elements[0] = api.add_const(&state.elements[0], c);
    Ok(())
}

/// `state' = rows * state`, one linear combination per output position.
pub(crate) fn mix<F: PrimeField, A: Arithmetic<F>>(
    api: &mut A,
    state: &mut PermutationState<A::Var>,
    rows: &[Vec<F>],
) {
    let mixed = rows
        .iter()
        .map(|row| api.linear_combination(&state.elements, row))
        .collect();
    state.elements = mixed;
}

/// Coordinate `output_index` of [`mix`].
pub(crate) fn mix_one<F: PrimeField, A: Arithmetic<F>>(
    api: &mut A,
    state: &PermutationState<A::Var>,
    rows: &[Vec<F>],
    output_index: usize,
) -> Result<A::Var, PoseidonError> {
    let row = rows.get(output_index).ok_or(PoseidonError::OutputCount {
        requested: output_index + 1,
        width: rows.len(),
    })?;
    Ok(api.linear_combination(&state.elements, row))
}

/// Checks that `mds` is `width x width`.
pub(crate) fn check_matrix<F>(mds: &[Vec<F>], width: usize) -> Result<(), PoseidonError> {
    if mds.len() != width {
        return Err(PoseidonError::MatrixShape {
            width,
            found: mds.len(),
        });
    }
    match mds.iter().find(|row| row.len() != width) {
        Some(row) => Err(PoseidonError::MatrixShape {
            width,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

/// Checks the width and round counts against the tabulated ones, then the constant table.
pub(crate) fn check_schedule<F>(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
    round_constants: &[F],
) -> Result<(), PoseidonError> {
    let expected_partial = self::partial_rounds(width)?;
    if full_rounds != FULL_ROUNDS || partial_rounds != expected_partial {
        return Err(PoseidonError::RoundCount {
            width,
            expected_full: FULL_ROUNDS,
            expected_partial,
            full: full_rounds,
            partial: partial_rounds,
        });
    }
    check_layout(width, full_rounds, partial_rounds, round_constants)
}

/// Checks the flattened round-constant table against arbitrary round counts.
pub(crate) fn check_layout<F>(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
    round_constants: &[F],
) -> Result<(), PoseidonError> {
    if width < MIN_WIDTH {
        return Err(PoseidonError::UnsupportedWidth(width));
    }
    if full_rounds < 2 || full_rounds % 2 != 0 {
        return Err(PoseidonError::OddFullRounds(full_rounds));
    }
    let expected = num_round_constants(width, full_rounds, partial_rounds).ok_or(
        PoseidonError::RoundConstantCount {
            expected: usize::MAX,
            actual: round_constants.len(),
        },
    )?;
    if round_constants.len() != expected {
        return Err(PoseidonError::RoundConstantCount {
            expected,
            actual: round_constants.len(),
        });
    }
    Ok(())
}

/// Checks that a round primitive for `width` elements is applied to a matching state.
pub(crate) fn check_state_width(width: usize, state_width: usize) -> Result<(), PoseidonError> {
    if state_width != width {
        return Err(PoseidonError::StateWidth {
            expected: width,
            actual: state_width,
        });
    }
    Ok(())
}

/// Checks that a state can be permuted and `n_outputs` extracted from it.
pub(crate) fn check_state(
    width: usize,
    state_width: usize,
    n_outputs: usize,
) -> Result<(), PoseidonError> {
    if state_width != width {
        return Err(PoseidonError::InputCount {
            expected: width - 1,
            actual: state_width.saturating_sub(1),
        });
    }
    if n_outputs > width {
        return Err(PoseidonError::OutputCount {
            requested: n_outputs,
            width,
        });
    }
    Ok(())
}

/// A Poseidon round strategy: a validated parameter set together with the schedule that
/// consumes it.
pub trait PoseidonPermutation<F: PrimeField> {
    fn width(&self) -> usize;

    /// Runs the permutation in place and returns the first `n_outputs` coordinates of the
    /// final linear layer.
    fn permute<A: Arithmetic<F>>(
        &self,
        api: &mut A,
        state: &mut PermutationState<A::Var>,
        n_outputs: usize,
    ) -> Result<Vec<A::Var>, PoseidonError>;
}

/// Parameters of the dense-matrix Poseidon schedule for one state width.
///
/// Built through [`PoseidonConfig::new`], [`PoseidonConfig::from_hades`] or
/// [`PoseidonConfig::from_parts`], all of which validate the table dimensions; the value is
/// immutable afterwards and can be shared freely between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseidonConfig<F> {
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
    round_constants: Vec<F>,
    /// Stored so that `state'[i] = sum_j mds[j][i] * state[j]`.
    mds: Matrix<F>,
    /// `transpose(mds)`, i.e. the matrix applied to the state.
    mix_rows: Matrix<F>,
}

impl<F: PrimeField> PoseidonConfig<F> {
    /// Builds the canonical parameters for `width`: eight full rounds, the tabulated number of
    /// partial rounds, and Grain-generated constants.
    pub fn new(width: usize) -> Result<Self, PoseidonError> {
        let partial_rounds = partial_rounds(width)?;
        let params = generate_parameters::<F>(width, FULL_ROUNDS, partial_rounds);
        Self::from_hades(width, FULL_ROUNDS, partial_rounds, &params)
    }

    /// Builds a config from canonical per-round constants, compressing them into the layout
    /// this schedule consumes.
    pub fn from_hades(
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
        params: &HadesParameters<F>,
    ) -> Result<Self, PoseidonError> {
        check_matrix(&params.mds, width)?;
        let round_constants = compress_round_constants(params, width, full_rounds, partial_rounds)?;
        let config = Self::from_parts(
            width,
            full_rounds,
            partial_rounds,
            round_constants,
            transpose(&params.mds),
        )?;
        debug!(
            "built Poseidon config: width={}, full_rounds={}, partial_rounds={}",
            width, full_rounds, partial_rounds
        );
        Ok(config)
    }

    /// Wraps precomputed tables already in the compressed layout, with `mds` stored as
    /// `state'[i] = sum_j mds[j][i] * state[j]`.
    ///
    /// `width` must be in `MIN_WIDTH..=MAX_WIDTH` and the round counts must be the tabulated
    /// ones for it.
    pub fn from_parts(
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
        round_constants: Vec<F>,
        mds: Matrix<F>,
    ) -> Result<Self, PoseidonError> {
        check_schedule(width, full_rounds, partial_rounds, &round_constants)?;
        Self::from_layout(width, full_rounds, partial_rounds, round_constants, mds)
    }

    /// [`Self::from_parts`] for arbitrary round counts. Only the table dimensions are checked.
    pub(crate) fn from_layout(
        width: usize,
        full_rounds: usize,
        partial_rounds: usize,
        round_constants: Vec<F>,
        mds: Matrix<F>,
    ) -> Result<Self, PoseidonError> {
        check_layout(width, full_rounds, partial_rounds, &round_constants)?;
        check_matrix(&mds, width)?;
        let mix_rows = transpose(&mds);
        Ok(Self {
            width,
            full_rounds,
            partial_rounds,
            round_constants,
            mds,
            mix_rows,
        })
    }

    pub fn full_rounds(&self) -> usize {
        self.full_rounds
    }

    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    pub fn round_constants(&self) -> &[F] {
        &self.round_constants
    }

    pub fn mds(&self) -> &[Vec<F>] {
        &self.mds
    }

    /// The matrix applied by [`Self::full_mix`], as rows.
    pub(crate) fn mix_rows(&self) -> &[Vec<F>] {
        &self.mix_rows
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
}

impl<F: PrimeField> PoseidonPermutation<F> for PoseidonConfig<F> {
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
            "poseidon permutation: width={}, outputs={}",
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

        // Transition into the partial rounds.
        state.apply_full_sbox(api);
        self.add_round_constants(api, state, half_full_rounds * t)?;
        self.full_mix(api, state)?;

        for r in 0..self.partial_rounds {
            state.apply_sbox(api, 0);
            self.add_partial_round_constant(api, state, partial_start + r)?;
            self.full_mix(api, state)?;
        }

        for r in 0..half_full_rounds - 1 {
            state.apply_full_sbox(api);
            self.add_round_constants(api, state, partial_start + self.partial_rounds + r * t)?;
            self.full_mix(api, state)?;
        }

        // The last full round's linear layer is evaluated only for the requested outputs.
        state.apply_full_sbox(api);
        (0..n_outputs)
            .map(|i| self.last_element_mix(api, state, i))
            .collect()
    }
}

/// Hashes exactly `width - 1` inputs: the state `[0, inputs..]` is permuted and the first
/// output coordinate returned.
pub fn hash<F: PrimeField, P: PoseidonPermutation<F>>(
    permutation: &P,
    inputs: &[F],
) -> Result<F, PoseidonError> {
    hash_circuit(&mut NativeArithmetic::new(), permutation, inputs)
}

/// [`hash`] over an arbitrary [`Arithmetic`] environment.
pub fn hash_circuit<F: PrimeField, P: PoseidonPermutation<F>, A: Arithmetic<F>>(
    api: &mut A,
    permutation: &P,
    inputs: &[A::Var],
) -> Result<A::Var, PoseidonError> {
    let width = permutation.width();
    if inputs.len() + 1 != width {
        return Err(PoseidonError::InputCount {
            expected: width - 1,
            actual: inputs.len(),
        });
    }

    let capacity = api.constant(F::ZERO);
    let mut state = PermutationState::new(capacity, inputs);
    permutation
        .permute(api, &mut state, 1)?
        .into_iter()
        .next()
        .ok_or(PoseidonError::OutputCount {
            requested: 1,
            width,
        })
}
