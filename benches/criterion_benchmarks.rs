use criterion::{black_box, criterion_group, criterion_main, Criterion};
use script_containers::config::{AdaptiveCacheConfig, EntityRegistryConfig, TrimLimits};
use script_containers::entity::HasToken;
use script_containers::token::{SequentialTokenAllocator, Token};
use script_containers::{AdaptiveCache, EntityRegistry};
use std::sync::Arc;

struct Entity {
    token: Token,
}

impl HasToken for Entity {
    fn token(&self) -> Token {
        self.token
    }
}

// Helper functions to create containers with the init pattern
fn make_cache(tracking: bool) -> AdaptiveCache<u64, u64> {
    let config = AdaptiveCacheConfig {
        capacity: 1024,
        tracking,
        trim_interval: None,
        ..AdaptiveCacheConfig::default()
    };
    AdaptiveCache::init(config, None)
}

fn make_registry(size: u64) -> EntityRegistry<String, Entity> {
    let mut registry = EntityRegistry::init(
        EntityRegistryConfig {
            capacity: size as usize,
            ..EntityRegistryConfig::default()
        },
        Some(Arc::new(SequentialTokenAllocator::new())),
    );
    for i in 0..size {
        registry
            .add_new(format!("cmd{i}"), |token| Entity { token })
            .unwrap();
    }
    registry
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: u64 = 1000;
    let mut group = c.benchmark_group("Cache Operations");

    for (label, tracking) in [("tracked", true), ("untracked", false)] {
        let mut cache = make_cache(tracking);
        for i in 0..CACHE_SIZE {
            cache.set(i, i);
        }

        group.bench_function(format!("{label} get hit"), |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.try_get(&black_box(i)));
                }
            });
        });

        group.bench_function(format!("{label} set overwrite"), |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.set(black_box(i), i));
                }
            });
        });
    }

    group.bench_function("trim 10% oldest", |b| {
        let limits = TrimLimits::with_max_count(CACHE_SIZE as usize * 9 / 10);
        b.iter_batched(
            || {
                let mut cache = make_cache(true);
                for i in 0..CACHE_SIZE {
                    cache.set(i, i);
                }
                cache
            },
            |mut cache| black_box(cache.trim_excess(&limits)),
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("trim by access range", |b| {
        let limits = TrimLimits {
            max_count: Some(CACHE_SIZE as usize / 2),
            min_access_count: Some(2),
            ..TrimLimits::UNBOUNDED
        };
        b.iter_batched(
            || {
                let mut cache = make_cache(true);
                for i in 0..CACHE_SIZE {
                    cache.set(i, i);
                    if i % 3 == 0 {
                        cache.try_get(&i);
                    }
                }
                cache
            },
            |mut cache| black_box(cache.trim_excess(&limits)),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();

    let mut group = c.benchmark_group("Registry Operations");
    let registry = make_registry(CACHE_SIZE);

    group.bench_function("get by name", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(registry.try_get(black_box(format!("cmd{i}").as_str())));
            }
        });
    });

    group.bench_function("lookup by token", |b| {
        b.iter(|| {
            for i in 1..=100 {
                black_box(registry.lookup_by_token(black_box(Token::new(i))));
            }
        });
    });

    group.bench_function("to_list_string with pattern", |b| {
        b.iter(|| black_box(registry.to_list_string(Some("cmd1*"), false).unwrap()));
    });

    group.bench_function("rename round trip", |b| {
        let mut registry = make_registry(CACHE_SIZE);
        b.iter(|| {
            registry.rename("cmd0", "tmp".to_string());
            registry.rename("tmp", "cmd0".to_string());
        });
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
