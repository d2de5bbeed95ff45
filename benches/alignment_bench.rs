use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use seqsim::bio::sequence::Sequence;
use seqsim::{SimilarityBuilder, SmithWaterman, SubstitutionMatrix};
use std::hint::black_box;

fn generate_protein_sequence(length: usize, seed: usize) -> Sequence {
    let amino_acids = b"ACDEFGHIKLMNPQRSTVWY";
    let residues = (0..length)
        .map(|i| amino_acids[(i * 7 + seed * 13 + i / 5) % amino_acids.len()])
        .collect();
    Sequence::new(seed, residues)
}

fn bench_local_alignment(c: &mut Criterion) {
    let matrix = SubstitutionMatrix::blosum62().unwrap();
    let aligner = SmithWaterman::new(&matrix, -12.0);
    let mut group = c.benchmark_group("smith_waterman/align");

    for length in [50, 100, 250, 500].iter() {
        let seq1 = generate_protein_sequence(*length, 1);
        let seq2 = generate_protein_sequence(*length, 2);

        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, _| {
            b.iter(|| aligner.align(black_box(seq1.as_bytes()), black_box(seq2.as_bytes())));
        });
    }

    group.finish();
}

fn bench_score_only(c: &mut Criterion) {
    let matrix = SubstitutionMatrix::blosum62().unwrap();
    let aligner = SmithWaterman::new(&matrix, -12.0);
    let mut group = c.benchmark_group("smith_waterman/score");

    for length in [250, 500, 1000, 2500].iter() {
        let seq1 = generate_protein_sequence(*length, 1);
        let seq2 = generate_protein_sequence(*length, 2);

        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, _| {
            b.iter(|| aligner.score(black_box(seq1.as_bytes()), black_box(seq2.as_bytes())));
        });
    }

    group.finish();
}

fn bench_similarity_matrix(c: &mut Criterion) {
    let matrix = SubstitutionMatrix::blosum62().unwrap();
    let mut group = c.benchmark_group("similarity/compute");
    group.sample_size(10);

    for count in [10, 25, 50].iter() {
        let sequences: Vec<Sequence> = (0..*count)
            .map(|k| generate_protein_sequence(150 + k * 3, k))
            .collect();
        let builder = SimilarityBuilder::new(&matrix, -12.0);

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| builder.compute(black_box(&sequences)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_local_alignment,
    bench_score_only,
    bench_similarity_matrix
);
criterion_main!(benches);
