//! A minimal recording constraint builder.
//!
//! This sits where a real arithmetic-circuit compiler would: every call through the
//! [`Arithmetic`] interface appends one gate over numbered wires. The recorded gate list can be
//! counted, and evaluated against concrete inputs to produce a witness, which is how the
//! constraint form of the permutation is checked against the native one. Proving and
//! verification are out of scope.

use alloc::vec::Vec;

use ark_ff::PrimeField;
use log::trace;

use crate::error::PoseidonError;
use crate::gates::arithmetic::Arithmetic;

/// A wire in the recorded circuit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Target(usize);

impl Target {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One recorded operation. Each gate except [`Gate::AssertEqual`] defines exactly one new wire,
/// namely the next unused wire index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Gate<F> {
    Input,
    Constant(F),
    Add(Target, Target),
    Mul(Target, Target),
    AddConst(Target, F),
    MulConst(Target, F),
    AssertEqual(Target, Target),
}

/// Number of recorded gates of each kind.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GateCounts {
    pub inputs: usize,
    pub constants: usize,
    pub add: usize,
    pub mul: usize,
    pub add_const: usize,
    pub mul_const: usize,
    pub assert_equal: usize,
}

#[derive(Clone, Debug)]
pub struct CircuitBuilder<F: PrimeField> {
    gates: Vec<Gate<F>>,
    num_wires: usize,
    inputs: Vec<Target>,
    outputs: Vec<Target>,
}

impl<F: PrimeField> Default for CircuitBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> CircuitBuilder<F> {
    pub fn new() -> Self {
        Self {
            gates: Vec::new(),
            num_wires: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn push(&mut self, gate: Gate<F>) -> Target {
        let target = Target(self.num_wires);
        self.num_wires += 1;
        self.gates.push(gate);
        target
    }

    /// Allocates a wire whose value is supplied when generating the witness.
    pub fn add_input(&mut self) -> Target {
        let target = self.push(Gate::Input);
        self.inputs.push(target);
        target
    }

    pub fn add_inputs(&mut self, n: usize) -> Vec<Target> {
        (0..n).map(|_| self.add_input()).collect()
    }

    /// Records that two wires must carry the same value.
    pub fn assert_equal(&mut self, a: Target, b: Target) {
        self.gates.push(Gate::AssertEqual(a, b));
    }

    /// Marks a wire as a circuit output.
    pub fn register_output(&mut self, target: Target) {
        self.outputs.push(target);
    }

    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    pub fn outputs(&self) -> &[Target] {
        &self.outputs
    }

    pub fn gate_counts(&self) -> GateCounts {
        let mut counts = GateCounts::default();
        for gate in &self.gates {
            match gate {
                Gate::Input => counts.inputs += 1,
                Gate::Constant(_) => counts.constants += 1,
                Gate::Add(..) => counts.add += 1,
                Gate::Mul(..) => counts.mul += 1,
                Gate::AddConst(..) => counts.add_const += 1,
                Gate::MulConst(..) => counts.mul_const += 1,
                Gate::AssertEqual(..) => counts.assert_equal += 1,
            }
        }
        counts
    }

    /// Evaluates every gate in order and returns the value of each wire.
    ///
    /// `inputs` are assigned to the input wires in allocation order. Fails if an equality
    /// assertion does not hold, or if a gate reads a wire that is not defined before it. Gates
    /// recorded with targets from another builder are only caught in the second case.
    pub fn generate_witness(&self, inputs: &[F]) -> Result<Witness<F>, PoseidonError> {
        if inputs.len() != self.inputs.len() {
            return Err(PoseidonError::WitnessInputCount {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }

        let mut values = Vec::with_capacity(self.num_wires);
        let mut next_input = inputs.iter();
        for (index, gate) in self.gates.iter().enumerate() {
            let value = match *gate {
                Gate::Input => match next_input.next() {
                    Some(&value) => value,
                    None => {
                        return Err(PoseidonError::WitnessInputCount {
                            expected: self.inputs.len(),
                            actual: inputs.len(),
                        })
                    }
                },
                Gate::Constant(c) => c,
                Gate::Add(a, b) => read(&values, a, index)? + read(&values, b, index)?,
                Gate::Mul(a, b) => read(&values, a, index)? * read(&values, b, index)?,
                Gate::AddConst(a, c) => read(&values, a, index)? + c,
                Gate::MulConst(a, c) => read(&values, a, index)? * c,
                Gate::AssertEqual(a, b) => {
                    if read(&values, a, index)? != read(&values, b, index)? {
                        return Err(PoseidonError::UnsatisfiedConstraint { index });
                    }
                    continue;
                }
            };
            values.push(value);
        }
        trace!("generated witness with {} wires", values.len());

        Ok(Witness { values })
    }
}

fn read<F: Copy>(values: &[F], target: Target, gate: usize) -> Result<F, PoseidonError> {
    values
        .get(target.0)
        .copied()
        .ok_or(PoseidonError::UndefinedWire {
            gate,
            wire: target.0,
        })
}

impl<F: PrimeField> Arithmetic<F> for CircuitBuilder<F> {
    type Var = Target;

    fn constant(&mut self, value: F) -> Target {
        self.push(Gate::Constant(value))
    }

    fn add(&mut self, a: &Target, b: &Target) -> Target {
        self.push(Gate::Add(*a, *b))
    }

    fn mul(&mut self, a: &Target, b: &Target) -> Target {
        self.push(Gate::Mul(*a, *b))
    }

    fn add_const(&mut self, a: &Target, c: F) -> Target {
        self.push(Gate::AddConst(*a, c))
    }

    fn mul_const(&mut self, a: &Target, c: F) -> Target {
        self.push(Gate::MulConst(*a, c))
    }
}

/// Wire values produced by [`CircuitBuilder::generate_witness`].
#[derive(Clone, Debug)]
pub struct Witness<F> {
    values: Vec<F>,
}

impl<F: PrimeField> Witness<F> {
    /// The value of `target`, or `None` if the wire does not exist in this witness.
    pub fn get(&self, target: Target) -> Option<F> {
        self.values.get(target.0).copied()
    }

    pub fn values(&self) -> &[F] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use ark_bn254::Fr;

    use crate::error::PoseidonError;
    use crate::gates::arithmetic::Arithmetic;
    use crate::gates::builder::CircuitBuilder;

    #[test]
    fn witness_follows_gates() -> anyhow::Result<()> {
        let mut builder = CircuitBuilder::<Fr>::new();
        let x = builder.add_input();
        let y = builder.add_input();
        let xy = builder.mul(&x, &y);
        let sum = builder.add(&xy, &x);
        let shifted = builder.add_const(&sum, Fr::from(10u64));
        let scaled = builder.mul_const(&shifted, Fr::from(2u64));
        builder.register_output(scaled);

        let witness = builder.generate_witness(&[Fr::from(3u64), Fr::from(4u64)])?;
        assert_eq!(witness.get(scaled), Some(Fr::from(50u64)));
        assert_eq!(builder.outputs(), &[scaled]);

        let counts = builder.gate_counts();
        assert_eq!(counts.inputs, 2);
        assert_eq!(counts.mul, 1);
        assert_eq!(counts.add, 1);
        assert_eq!(counts.add_const, 1);
        assert_eq!(counts.mul_const, 1);
        Ok(())
    }

    #[test]
    fn unsatisfied_assertion() {
        let mut builder = CircuitBuilder::<Fr>::new();
        let x = builder.add_input();
        let expected = builder.constant(Fr::from(9u64));
        let squared = builder.mul(&x, &x);
        builder.assert_equal(squared, expected);

        assert!(builder.generate_witness(&[Fr::from(3u64)]).is_ok());
        assert_eq!(
            builder.generate_witness(&[Fr::from(4u64)]).unwrap_err(),
            PoseidonError::UnsatisfiedConstraint { index: 3 }
        );
    }

    #[test]
    fn wrong_input_count() {
        let mut builder = CircuitBuilder::<Fr>::new();
        builder.add_inputs(3);
        assert_eq!(
            builder.generate_witness(&[Fr::from(1u64)]).unwrap_err(),
            PoseidonError::WitnessInputCount {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn foreign_targets_are_rejected() {
        let mut large = CircuitBuilder::<Fr>::new();
        let inputs = large.add_inputs(4);
        let foreign = large.add(&inputs[2], &inputs[3]);

        let mut small = CircuitBuilder::<Fr>::new();
        let x = small.add_input();
        small.mul(&x, &foreign);
        assert_eq!(
            small.generate_witness(&[Fr::from(2u64)]).unwrap_err(),
            PoseidonError::UndefinedWire { gate: 1, wire: 4 }
        );

        let mut other = CircuitBuilder::<Fr>::new();
        let y = other.add_input();
        let witness = other.generate_witness(&[Fr::from(5u64)]).unwrap();
        assert_eq!(witness.get(y), Some(Fr::from(5u64)));
        assert_eq!(witness.get(foreign), None);
    }
}
