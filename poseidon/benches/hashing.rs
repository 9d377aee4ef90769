use ark_bn254::Fr;
use ark_ff::UniformRand;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use poseidon_circuits::gates::builder::CircuitBuilder;
use poseidon_circuits::hash::poseidon::{hash, hash_circuit, PoseidonPermutation};
use poseidon_circuits::hash::poseidon_bn254::{config, sparse_config};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_strategy<P: PoseidonPermutation<Fr>>(c: &mut Criterion, name: &str, permutation: &P) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let width = permutation.width();
    let inputs: Vec<Fr> = (1..width).map(|_| Fr::rand(&mut rng)).collect();

    c.bench_with_input(
        BenchmarkId::new(format!("{name}/native"), width),
        &inputs,
        |b, inputs| b.iter(|| hash(permutation, black_box(inputs))),
    );

    c.bench_function(&format!("{name}/build_circuit/{width}"), |b| {
        b.iter(|| {
            let mut builder = CircuitBuilder::<Fr>::new();
            let targets = builder.add_inputs(width - 1);
            let out = hash_circuit(&mut builder, permutation, &targets);
            black_box(out)
        })
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    for width in [3, 4, 5, 9] {
        if let (Ok(dense), Ok(sparse)) = (config(width), sparse_config(width)) {
            bench_strategy(c, "poseidon", dense);
            bench_strategy(c, "poseidon_sparse", sparse);
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
