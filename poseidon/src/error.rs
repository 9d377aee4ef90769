use thiserror::Error;

/// Errors raised while building Poseidon parameters, running the permutation, or generating a
/// witness for the recorded constraints.
///
/// Every variant is a deterministic function of the static configuration and the caller's
/// inputs, and is reported before any round touches the state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseidonError {
    /// The state does not hold exactly `width - 1` inputs behind the capacity element.
    #[error("expected {expected} inputs for this width, got {actual}")]
    InputCount { expected: usize, actual: usize },

    /// No partial-round count is tabulated for this width.
    #[error("unsupported state width {0}, expected a width in {min}..={max}", min = crate::hash::poseidon::MIN_WIDTH, max = crate::hash::poseidon::MAX_WIDTH)]
    UnsupportedWidth(usize),

    /// A mixing matrix is not `width x width`.
    #[error("mixing matrix must be {width}x{width}, found a row of length {found}")]
    MatrixShape { width: usize, found: usize },

    /// The full rounds cannot be split evenly around the partial rounds.
    #[error("number of full rounds must be even and at least 2, got {0}")]
    OddFullRounds(usize),

    /// The round counts differ from the tabulated ones for this width.
    #[error("width {width} uses {expected_full} full and {expected_partial} partial rounds, got {full} and {partial}")]
    RoundCount {
        width: usize,
        expected_full: usize,
        expected_partial: usize,
        full: usize,
        partial: usize,
    },

    /// A round primitive was applied to a state of a different width than its parameters.
    #[error("parameters are for a state of width {expected}, got a state of width {actual}")]
    StateWidth { expected: usize, actual: usize },

    /// More outputs were requested than the state holds.
    #[error("cannot extract {requested} outputs from a state of width {width}")]
    OutputCount { requested: usize, width: usize },

    /// A linear layer has no inverse, so its constants cannot be rearranged.
    #[error("mixing matrix is singular")]
    SingularMatrix,

    /// The flattened round-constant table does not match the round schedule.
    #[error("round schedule consumes {expected} round constants, got {actual}")]
    RoundConstantCount { expected: usize, actual: usize },

    /// The flattened sparse-vector table does not match the partial rounds.
    #[error("partial rounds consume {expected} sparse-matrix entries, got {actual}")]
    SparseVectorCount { expected: usize, actual: usize },

    /// A witness was requested with the wrong number of input values.
    #[error("circuit has {expected} input wires, got {actual} values")]
    WitnessInputCount { expected: usize, actual: usize },

    /// A gate reads a wire that is not defined before it.
    #[error("gate {gate} reads undefined wire {wire}")]
    UndefinedWire { gate: usize, wire: usize },

    /// An equality assertion does not hold for the supplied inputs.
    #[error("constraint {index} is not satisfied")]
    UnsatisfiedConstraint { index: usize },
}
