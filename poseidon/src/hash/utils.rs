//! Derivations that rewrite the textbook round structure into cheaper equivalent forms.

use alloc::vec;
use alloc::vec::Vec;

use ark_ff::PrimeField;

use crate::error::PoseidonError;
use crate::hash::grain::HadesParameters;
use crate::hash::matrix::{identity, invert, mat_mul, mat_vec, minor, Matrix};
use crate::hash::poseidon::check_matrix;

fn check_hades<F>(
    params: &HadesParameters<F>,
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> Result<(), PoseidonError> {
    check_matrix(&params.mds, width)?;
    if full_rounds < 2 || full_rounds % 2 != 0 {
        return Err(PoseidonError::OddFullRounds(full_rounds));
    }
    let rounds = full_rounds + partial_rounds;
    if params.round_constants.len() != rounds
        || params.round_constants.iter().any(|rc| rc.len() != width)
    {
        return Err(PoseidonError::RoundConstantCount {
            expected: rounds * width,
            actual: params.round_constants.iter().map(Vec::len).sum(),
        });
    }
    Ok(())
}

/// Moves every round's constants behind the preceding linear layer, so that they are added
/// right after the S-box of the previous round, and then pushes all but the first coordinate
/// of each partial round's constants back into the last full round. The result is laid out as
///
/// * `width` constants added before the first round,
/// * `width` constants for each of the first `full_rounds / 2` rounds,
/// * one constant for `state[0]` for each partial round,
/// * `width` constants for each of the remaining full rounds but the last.
pub(crate) fn compress_round_constants<F: PrimeField>(
    params: &HadesParameters<F>,
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> Result<Vec<F>, PoseidonError> {
    check_hades(params, width, full_rounds, partial_rounds)?;
    let mds_inv = invert(&params.mds)?;
    let half_full_rounds = full_rounds / 2;
    let rc = &params.round_constants;

    // after_sbox[r] is added after the S-box of round r.
    let mut after_sbox: Vec<Vec<F>> = rc[1..].iter().map(|c| mat_vec(&mds_inv, c)).collect();

    for r in (half_full_rounds..half_full_rounds + partial_rounds).rev() {
        let mut tail = vec![F::ZERO; width];
        for (t, x) in tail[1..].iter_mut().zip(after_sbox[r][1..].iter_mut()) {
            *t = *x;
            *x = F::ZERO;
        }
        let pushed = mat_vec(&mds_inv, &tail);
        for (x, y) in after_sbox[r - 1].iter_mut().zip(pushed) {
            *x += y;
        }
    }

    let mut constants = rc[0].clone();
    for c in &after_sbox[..half_full_rounds] {
        constants.extend_from_slice(c);
    }
    constants.extend(
        after_sbox[half_full_rounds..half_full_rounds + partial_rounds]
            .iter()
            .map(|c| c[0]),
    );
    for c in &after_sbox[half_full_rounds + partial_rounds..] {
        constants.extend_from_slice(c);
    }
    Ok(constants)
}

/// Factors the partial-round linear layers as `M = M' * S`, where `S` is sparse (dense first
/// row and column, identity elsewhere) and `M'` is folded into the previous round.
///
/// `mds` is applied as `state' = mds * state`. Returns the matrix that replaces `mds` in the
/// round preceding the partial rounds, and for each partial round the `2 * width - 1` entries
/// `[S[0][0], S[0][1..], S[1..][0]]`.
pub(crate) fn sparse_factorization<F: PrimeField>(
    mds: &[Vec<F>],
    partial_rounds: usize,
) -> Result<(Matrix<F>, Vec<F>), PoseidonError> {
    let width = mds.len();
    let mut sparse_rounds = vec![Vec::new(); partial_rounds];
    let mut current: Matrix<F> = mds.to_vec();

    for r in (0..partial_rounds).rev() {
        let m_hat = minor(&current);
        let m_hat_inv = invert(&m_hat)?;
        let w = &current[0][1..];
        let w_hat = (0..width - 1).map(|j| {
            w.iter()
                .zip(m_hat_inv.iter())
                .map(|(&w_k, row)| w_k * row[j])
                .sum::<F>()
        });

        let mut entries = Vec::with_capacity(2 * width - 1);
        entries.push(current[0][0]);
        entries.extend(w_hat);
        entries.extend(current[1..].iter().map(|row| row[0]));
        sparse_rounds[r] = entries;

        let mut dense = identity(width);
        for (row, m_hat_row) in dense[1..].iter_mut().zip(&m_hat) {
            row[1..].copy_from_slice(m_hat_row);
        }
        current = mat_mul(&dense, mds);
    }

    Ok((current, sparse_rounds.concat()))
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::error::PoseidonError;
    use crate::hash::grain::{generate_parameters, HadesParameters};
    use crate::hash::matrix::{mat_mul, Matrix};
    use crate::hash::utils::{compress_round_constants, sparse_factorization};

    fn fr(s: &str) -> Fr {
        Fr::from_str(s).unwrap()
    }

    #[test]
    fn compressed_bn254_width_4() -> anyhow::Result<()> {
        let params = generate_parameters::<Fr>(4, 8, 56);
        let constants = compress_round_constants(&params, 4, 8, 56)?;
        assert_eq!(constants.len(), 4 * 8 + 56);
        assert_eq!(&constants[..4], params.round_constants[0].as_slice());
        assert_eq!(
            constants[20],
            fr("7810259695400914964411387917274296266504340291833964145271847716091273468172")
        );
        Ok(())
    }

    #[test]
    fn sparse_factors_rebuild_mds() -> anyhow::Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let width = 4;
        let mds: Matrix<Fr> = (0..width)
            .map(|_| (0..width).map(|_| Fr::rand(&mut rng)).collect())
            .collect();

        let (pre, sparse) = sparse_factorization(&mds, 1)?;
        assert_eq!(sparse.len(), 2 * width - 1);

        let mut s = vec![vec![Fr::from(0u64); width]; width];
        s[0][..width].copy_from_slice(&sparse[..width]);
        for i in 1..width {
            s[i][0] = sparse[width + i - 1];
            s[i][i] = Fr::from(1u64);
        }
        let mut dense = vec![vec![Fr::from(0u64); width]; width];
        dense[0][0] = Fr::from(1u64);
        for i in 1..width {
            dense[i][1..].copy_from_slice(&mds[i][1..]);
        }
        assert_eq!(mat_mul(&s, &dense), mds);
        assert_eq!(pre, mat_mul(&dense, &mds));
        Ok(())
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        let params = HadesParameters {
            round_constants: vec![vec![Fr::from(1u64); 3]; 10],
            mds: vec![vec![Fr::from(1u64); 3]; 3],
        };
        assert_eq!(
            compress_round_constants(&params, 3, 8, 3).unwrap_err(),
            PoseidonError::RoundConstantCount {
                expected: 33,
                actual: 30
            }
        );
        assert_eq!(
            compress_round_constants(&params, 3, 8, 2).unwrap_err(),
            PoseidonError::SingularMatrix
        );
    }
}
