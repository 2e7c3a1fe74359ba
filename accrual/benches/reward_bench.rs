use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use guru_accrual::{reward, AccrualEngine, EngineConfig};
use guru_nullables::{NullClock, NullLedgerStore};
use guru_types::{Amount, HashRate, Timestamp, UserId};

fn bench_reward_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("reward_for");
    let rate = EngineConfig::default().reward_rate;

    for hash_units in [1u64, 100, 10_000] {
        let hash_rate = HashRate::from_units(hash_units).unwrap();
        group.bench_with_input(
            BenchmarkId::new("one_day", hash_units),
            &hash_rate,
            |b, hash_rate| {
                b.iter(|| reward::reward_for(black_box(86_400_000), *hash_rate, black_box(rate)));
            },
        );
    }

    group.finish();
}

fn bench_accrue_with_skew(c: &mut Criterion) {
    let rate: Amount = EngineConfig::default().reward_rate;
    c.bench_function("accrue_skewed", |b| {
        b.iter(|| {
            reward::accrue(
                black_box(Some(Timestamp::from_secs(500))),
                black_box(Timestamp::from_secs(100)),
                HashRate::ONE,
                rate,
            )
        });
    });
}

fn bench_claim_cycle(c: &mut Criterion) {
    let engine = AccrualEngine::new(
        NullLedgerStore::new(),
        NullClock::new(0),
        EngineConfig::default(),
    )
    .unwrap();
    let user = UserId::new(1);
    engine.start(user).unwrap();

    c.bench_function("claim_null_store", |b| {
        b.iter(|| {
            engine.clock().advance(1);
            black_box(engine.claim(user).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_reward_formula,
    bench_accrue_with_skew,
    bench_claim_cycle
);
criterion_main!(benches);
