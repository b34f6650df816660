//! # Registry Performance Benchmark
//!
//! Measures the sparse-set hot paths:
//! - Insert and swap-and-pop erase
//! - Dense single-type iteration (`each`)
//! - Multi-type joins (`view`) with a small and a large driver
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{Component, Entity, Registry, RegistryConfig, SparseSet};

/// Entity count for the iteration benchmarks.
const ENTITY_COUNT: u64 = 100_000;

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
}
impl Component for Velocity {}

#[derive(Clone, Copy)]
struct Health(u32);
impl Component for Health {}

/// Every entity has a Position, half have a Velocity, one in a hundred has Health.
fn populated_registry(count: u64) -> Registry {
    let mut registry = Registry::with_config(RegistryConfig::isolated()).unwrap();
    for _ in 0..count {
        let entity = registry.new_entity();
        let raw = entity.to_raw();
        registry
            .add_component(entity, Position { x: 0.0, y: 0.0 })
            .unwrap();
        if raw % 2 == 0 {
            registry
                .add_component(entity, Velocity { x: 1.0, y: 0.5 })
                .unwrap();
        }
        if raw % 100 == 0 {
            registry.add_component(entity, Health(100)).unwrap();
        }
    }
    registry
}

/// Benchmark: Insert N entries into a fresh sparse set.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_set_insert");

    for count in [1_000u64, 10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut set = SparseSet::new();
                for raw in 1..=count {
                    set.insert(Entity::from_raw(raw), raw).unwrap();
                }
                black_box(set.len())
            });
        });
    }

    group.finish();
}

/// Benchmark: Erase every other entry (forces swaps).
fn bench_erase(c: &mut Criterion) {
    c.bench_function("sparse_set_erase_half_100K", |b| {
        b.iter_batched(
            || {
                let mut set = SparseSet::new();
                for raw in 1..=ENTITY_COUNT {
                    set.insert(Entity::from_raw(raw), raw).unwrap();
                }
                set
            },
            |mut set| {
                for raw in (1..=ENTITY_COUNT).step_by(2) {
                    black_box(set.erase(Entity::from_raw(raw)));
                }
                set
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: Dense iteration over one component type.
fn bench_each(c: &mut Criterion) {
    let mut registry = populated_registry(ENTITY_COUNT);

    c.bench_function("each_position_100K", |b| {
        b.iter(|| {
            registry.each::<Position, _>(|_, pos| {
                pos.x += 0.001;
                pos.y += 0.001;
            });
        });
    });
}

/// Benchmark: Joins with a large and a small driver.
fn bench_view(c: &mut Criterion) {
    let mut registry = populated_registry(ENTITY_COUNT);

    c.bench_function("view_position_velocity_100K", |b| {
        b.iter(|| {
            registry.view::<(Position, Velocity), _>(|_, (pos, vel)| {
                pos.x += vel.x;
                pos.y += vel.y;
            });
        });
    });

    c.bench_function("view_position_velocity_health_100K", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            registry.view::<(Position, Velocity, Health), _>(|_, (_, _, health)| {
                hits += health.0;
            });
            black_box(hits)
        });
    });
}

/// Benchmark: Entity churn through the free list.
fn bench_entity_churn(c: &mut Criterion) {
    let mut registry = populated_registry(10_000);

    c.bench_function("remove_and_recycle_entity", |b| {
        b.iter(|| {
            let entity = registry.new_entity();
            registry
                .add_component(entity, Position { x: 1.0, y: 1.0 })
                .unwrap();
            black_box(registry.remove_entity(entity))
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_erase,
    bench_each,
    bench_view,
    bench_entity_churn,
);
criterion_main!(benches);
