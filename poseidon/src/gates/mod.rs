//! The add/multiply layer the permutation is expressed in, with a native evaluator and a
//! recording constraint builder.

pub mod arithmetic;
pub mod builder;
