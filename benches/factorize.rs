use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rlzstore::coder::VarByteCoder;
use rlzstore::factor::FactorSelectionPolicy;
use rlzstore::factorize::{factorize_parallel, FactorizeConfig};
use rlzstore::selfindex::SelfIndex;

fn make_corpus(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog ";
    pattern.iter().cycle().take(len).copied().collect()
}

fn bench_factorize(c: &mut Criterion) {
    let dict = Arc::new(make_corpus(64 * 1024));
    let text = make_corpus(2 * 1024 * 1024);
    let index = Arc::new(SelfIndex::build(&dict));
    let coder = VarByteCoder;

    let mut group = c.benchmark_group("factorize_parallel");
    for threads in [1usize, 2, 4, 8] {
        let cfg = FactorizeConfig {
            factorization_block_size: 4096,
            num_threads: threads,
            selection_policy: FactorSelectionPolicy::SuffixArraySample,
        };
        group.bench_with_input(BenchmarkId::from_parameter(threads), &cfg, |b, cfg| {
            b.iter(|| black_box(factorize_parallel(&text, &index, &dict, &coder, cfg).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_factorize);
criterion_main!(benches);
