use core::fmt::Debug;
use core::marker::PhantomData;

use ark_ff::PrimeField;

/// The add/multiply environment the permutation is written against.
///
/// An implementation either evaluates field elements directly ([`NativeArithmetic`]) or records
/// each operation as a constraint over symbolic wires ([`CircuitBuilder`]). The Poseidon code
/// never branches on values, so both produce the same sequence of operations.
///
/// [`CircuitBuilder`]: crate::gates::builder::CircuitBuilder
pub trait Arithmetic<F: PrimeField> {
    /// A value tracked by the environment.
    type Var: Clone + Debug;

    fn constant(&mut self, value: F) -> Self::Var;

    fn add(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    fn mul(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    /// Adds a fixed field constant, e.g. a round constant.
    fn add_const(&mut self, a: &Self::Var, c: F) -> Self::Var;

    /// Scales by a fixed field constant, e.g. a mixing-matrix entry.
    fn mul_const(&mut self, a: &Self::Var, c: F) -> Self::Var;

    /// `sum_j coeffs[j] * vars[j]`, as `n` scalings and `n - 1` additions.
    ///
    /// The slices must be non-empty and of equal length.
    fn linear_combination(&mut self, vars: &[Self::Var], coeffs: &[F]) -> Self::Var {
        debug_assert_eq!(vars.len(), coeffs.len());
        let mut acc = self.mul_const(&vars[0], coeffs[0]);
        for (var, &coeff) in vars.iter().zip(coeffs).skip(1) {
            let term = self.mul_const(var, coeff);
            acc = self.add(&acc, &term);
        }
        acc
    }
}

/// Evaluates every operation immediately over concrete field elements.
#[derive(Copy, Clone, Debug, Default)]
pub struct NativeArithmetic<F>(PhantomData<F>);

impl<F: PrimeField> NativeArithmetic<F> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<F: PrimeField> Arithmetic<F> for NativeArithmetic<F> {
    type Var = F;

    #[inline]
    fn constant(&mut self, value: F) -> F {
        value
    }

    #[inline]
    fn add(&mut self, a: &F, b: &F) -> F {
        *a + b
    }

    #[inline]
    fn mul(&mut self, a: &F, b: &F) -> F {
        *a * b
    }

    #[inline]
    fn add_const(&mut self, a: &F, c: F) -> F {
        *a + c
    }

    #[inline]
    fn mul_const(&mut self, a: &F, c: F) -> F {
        *a * c
    }
}

#[cfg(test)]
mod tests {
    use ark_bn254::Fr;

    use crate::gates::arithmetic::{Arithmetic, NativeArithmetic};

    #[test]
    fn native_linear_combination() {
        let mut api = NativeArithmetic::<Fr>::new();
        let vars = [Fr::from(2u64), Fr::from(3u64), Fr::from(5u64)];
        let coeffs = [Fr::from(7u64), Fr::from(11u64), Fr::from(13u64)];
        let lc = api.linear_combination(&vars, &coeffs);
        assert_eq!(lc, Fr::from(2 * 7 + 3 * 11 + 5 * 13u64));
    }

    #[test]
    fn native_ops() {
        let mut api = NativeArithmetic::<Fr>::new();
        let a = api.constant(Fr::from(6u64));
        let b = Fr::from(4u64);
        assert_eq!(api.add(&a, &b), Fr::from(10u64));
        assert_eq!(api.mul(&a, &b), Fr::from(24u64));
        assert_eq!(api.add_const(&a, Fr::from(1u64)), Fr::from(7u64));
        assert_eq!(api.mul_const(&a, Fr::from(3u64)), Fr::from(18u64));
    }
}
