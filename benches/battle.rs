//! Battle tick benchmarks
//!
//! Measures target scans and full ticks at growing agent counts; the closest
//! enemy scan is linear, so a tick is quadratic in the worst case.
//!
//! Run with: cargo bench --bench battle

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use battlefield_sim::game::class::UnitKind;
use battlefield_sim::game::constants::sim::DT;
use battlefield_sim::game::game_loop::{Battle, BattleMode};
use battlefield_sim::game::spatial::{find_closest, TargetFilter};
use battlefield_sim::game::state::Presentation;
use battlefield_sim::util::vec2::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A battle with `count` agents split evenly between the camps, scattered
/// over the field
fn create_battle(count: usize) -> Battle {
    let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(0xBA77));
    let mut rng = StdRng::seed_from_u64(count as u64);

    for i in 0..count {
        let kinds = if i % 2 == 0 { UnitKind::PEASANTS } else { UnitKind::SIRES };
        let kind = kinds[rng.gen_range(0..kinds.len())];
        let position = Vec2::new(rng.gen_range(0.0..1067.0), rng.gen_range(0.0..600.0));
        // Class defaults are valid
        let _ = battle.spawn(kind, position);
    }

    battle
}

/// Benchmark a single closest-enemy scan
fn bench_find_closest(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_closest");
    group.sample_size(50);

    for count in [100, 250, 500, 1000] {
        let battle = create_battle(count);
        let agents = battle.field().agents();
        let seeker = &agents[0];
        let filter = TargetFilter::AliveEnemyUnderCap {
            of: seeker.team,
            max_followers: seeker.config.max_followers,
        };

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("linear_scan", count), &count, |b, _| {
            b.iter(|| black_box(find_closest(agents, seeker, filter)))
        });
    }
    group.finish();
}

/// Benchmark a full battle tick (all systems) at various agent counts
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(30);

    for count in [50, 100, 250, 500] {
        let mut battle = create_battle(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("complete", count), &count, |b, _| {
            b.iter(|| {
                battle.tick(DT);
                black_box(battle.drain_events())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_closest, bench_full_tick);

criterion_main!(benches);
