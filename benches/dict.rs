use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rlzstore::dict::{DictConfig, DictionaryBuilder};

fn make_corpus(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog ";
    pattern.iter().cycle().take(len).copied().collect()
}

fn bench_dict_build(c: &mut Criterion) {
    let corpus = make_corpus(2 * 1024 * 1024);
    let cfg = DictConfig {
        sample_block_size: 1024,
        estimator_window: 16,
        budget_bytes: 64 * 1024,
        heavy_threshold: 50,
        cms_epsilon: 1.0 / 3_000_000.0,
        cms_delta: 0.1,
        num_threads: 4,
    };

    c.bench_function("dict_build_2mb", |b| {
        b.iter(|| black_box(DictionaryBuilder::build(&corpus, &cfg).unwrap()))
    });
}

criterion_group!(benches, bench_dict_build);
criterion_main!(benches);
