use std::convert::Infallible;
use std::time::Duration;

use cache::TtlCache;
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_hit_path(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache: TtlCache<String> = TtlCache::new("bench", Duration::from_secs(3600));

    rt.block_on(cache.insert("product:hot", "widget".to_string()));

    c.bench_function("cache/get_or_load_hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let value: Result<_, Infallible> = cache
                    .get_or_load("product:hot", || async { Ok("widget".to_string()) })
                    .await;
                value.unwrap()
            })
        });
    });
}

fn bench_miss_and_populate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache: TtlCache<String> = TtlCache::new("bench", Duration::from_secs(3600));

    c.bench_function("cache/get_or_load_miss", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let key = format!("product:{n}");
            rt.block_on(async {
                let value: Result<_, Infallible> = cache
                    .get_or_load(&key, || async { Ok("widget".to_string()) })
                    .await;
                value.unwrap()
            })
        });
    });
}

fn bench_invalidate_prefix(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cache/invalidate_prefix_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let cache: TtlCache<u64> = TtlCache::new("bench", Duration::from_secs(3600));
                for i in 0..1000u64 {
                    cache.insert(format!("search:q{i}"), i).await;
                }
                cache.invalidate_prefix("search:").await
            })
        });
    });
}

criterion_group!(
    benches,
    bench_hit_path,
    bench_miss_and_populate,
    bench_invalidate_prefix
);
criterion_main!(benches);
