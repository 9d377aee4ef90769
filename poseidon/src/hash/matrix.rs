//! Dense square-matrix helpers used while deriving permutation parameters.
//!
//! Matrices are row-major `Vec<Vec<F>>` and act on column vectors: `(M * v)[i] = sum_j M[i][j] *
//! v[j]`. This is the mathematical convention; the stored mixing matrix of a
//! [`PoseidonConfig`](crate::hash::poseidon::PoseidonConfig) is the transpose of the matrix it
//! applies.

use alloc::vec;
use alloc::vec::Vec;

use ark_ff::PrimeField;

use crate::error::PoseidonError;

pub type Matrix<F> = Vec<Vec<F>>;

pub(crate) fn identity<F: PrimeField>(n: usize) -> Matrix<F> {
    let mut m = vec![vec![F::ZERO; n]; n];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = F::ONE;
    }
    m
}

pub(crate) fn transpose<F: PrimeField>(m: &[Vec<F>]) -> Matrix<F> {
    let n = m.len();
    (0..n)
        .map(|i| (0..n).map(|j| m[j][i]).collect::<Vec<F>>())
        .collect()
}

/// `A * B`.
pub(crate) fn mat_mul<F: PrimeField>(a: &[Vec<F>], b: &[Vec<F>]) -> Matrix<F> {
    let n = a.len();
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| (0..n).map(|k| a[i][k] * b[k][j]).sum::<F>())
                .collect::<Vec<F>>()
        })
        .collect()
}

/// `M * v`.
pub(crate) fn mat_vec<F: PrimeField>(m: &[Vec<F>], v: &[F]) -> Vec<F> {
    m.iter()
        .map(|row| row.iter().zip(v).map(|(&a, &b)| a * b).sum::<F>())
        .collect()
}

/// Inverse via Gauss-Jordan elimination on `[M | I]`.
pub(crate) fn invert<F: PrimeField>(m: &[Vec<F>]) -> Result<Matrix<F>, PoseidonError> {
    let n = m.len();
    let mut aug: Matrix<F> = m.to_vec();
    let mut inv = identity(n);

    for col in 0..n {
        let pivot_row = (col..n)
            .find(|&r| !aug[r][col].is_zero())
            .ok_or(PoseidonError::SingularMatrix)?;
        if pivot_row != col {
            aug.swap(col, pivot_row);
            inv.swap(col, pivot_row);
        }

        let pivot_inv = aug[col][col]
            .inverse()
            .ok_or(PoseidonError::SingularMatrix)?;
        for j in 0..n {
            aug[col][j] *= pivot_inv;
            inv[col][j] *= pivot_inv;
        }

        let aug_pivot = aug[col].clone();
        let inv_pivot = inv[col].clone();
        for i in (0..n).filter(|&i| i != col) {
            let factor = aug[i][col];
            if factor.is_zero() {
                continue;
            }
            for j in 0..n {
                aug[i][j] -= factor * aug_pivot[j];
                inv[i][j] -= factor * inv_pivot[j];
            }
        }
    }

    Ok(inv)
}

/// The bottom-right `(n-1) x (n-1)` block `M[1..n][1..n]`.
pub(crate) fn minor<F: PrimeField>(m: &[Vec<F>]) -> Matrix<F> {
    m[1..].iter().map(|row| row[1..].to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::error::PoseidonError;
    use crate::hash::matrix::{identity, invert, mat_mul, mat_vec, minor, transpose, Matrix};

    fn random_matrix(n: usize, seed: u64) -> Matrix<Fr> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| (0..n).map(|_| Fr::rand(&mut rng)).collect())
            .collect()
    }

    #[test]
    fn inverse_roundtrip() -> anyhow::Result<()> {
        for n in [1, 2, 4, 9] {
            let m = random_matrix(n, n as u64);
            let m_inv = invert(&m)?;
            assert_eq!(mat_mul(&m, &m_inv), identity::<Fr>(n));
            assert_eq!(mat_mul(&m_inv, &m), identity::<Fr>(n));
        }
        Ok(())
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut m = random_matrix(3, 7);
        m[2] = m[0].clone();
        assert_eq!(invert(&m).unwrap_err(), PoseidonError::SingularMatrix);
    }

    #[test]
    fn transpose_and_mat_vec_agree() {
        let m = random_matrix(3, 11);
        let v = vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let mv = mat_vec(&m, &v);
        let mt = transpose(&m);
        for i in 0..3 {
            let column_dot = (0..3).map(|j| mt[j][i] * v[j]).sum::<Fr>();
            assert_eq!(mv[i], column_dot);
        }
    }

    #[test]
    fn minor_drops_first_row_and_column() {
        let m = random_matrix(4, 5);
        let sub = minor(&m);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub[0][0], m[1][1]);
        assert_eq!(sub[2][2], m[3][3]);
    }
}
