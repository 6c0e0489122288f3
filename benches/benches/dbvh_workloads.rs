// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dbvh::{
    Aabb, AvlOnly, BranchAndBound, BvhConfig, DynamicBvh, FlatScan, GreedyDescent, Ray,
    Rotations, SpatialIndex,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn xywh(x: f64, y: f64, w: f64, h: f64) -> Aabb<f64> {
    Aabb::new([x, y], [x + w, y + h])
}

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(xywh(x as f64 * cell, y as f64 * cell, cell, cell));
        }
    }
    out
}

fn gen_random_rects(count: usize, world: f64, size: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (world - size);
        let y0 = rng.next_f64() * (world - size);
        out.push(xywh(x0, y0, size, size));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(xywh(cx + dx, cy + dy, 12.0, 12.0));
        }
    }
    out
}

fn gen_random_cubes(count: usize, world: f64, size: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    for _ in 0..count {
        let min = [
            rng.next_f64() * world,
            rng.next_f64() * world,
            rng.next_f64() * world,
        ];
        out.push(Aabb::new(min, min.map(|v| v + size)));
    }
    out
}

fn build<I: SpatialIndex<f64, u32>>(mut idx: I, rects: &[Aabb<f64>]) -> I {
    for (i, r) in rects.iter().enumerate() {
        let _ = idx.insert(i as u32, r.clone());
    }
    idx
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let query = xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        for leaf_size in [1, 4] {
            group.bench_function(format!("grid_n{n}_leaf{leaf_size}"), |b| {
                b.iter_batched(
                    || DynamicBvh::<f64, u32>::new(2, leaf_size, 1.0).unwrap(),
                    |idx| {
                        let idx = build(idx, &rects);
                        black_box(idx.broad_phase(&query).unwrap().len());
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    let rects = gen_clustered_rects(32, 128, 80.0);
    group.bench_function("clustered_greedy", |b| {
        b.iter_batched(
            || DynamicBvh::<f64, u32>::new(2, 1, 1.0).unwrap(),
            |idx| black_box(build(idx, &rects).height()),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("clustered_branch_and_bound", |b| {
        b.iter_batched(
            || {
                DynamicBvh::<f64, u32, BranchAndBound, Rotations>::with_policies(
                    BvhConfig::new(2),
                    BranchAndBound::default(),
                    Rotations,
                )
                .unwrap()
            },
            |idx| black_box(build(idx, &rects).height()),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("clustered_avl_only", |b| {
        b.iter_batched(
            || {
                DynamicBvh::<f64, u32, GreedyDescent, AvlOnly>::with_policies(
                    BvhConfig::new(2),
                    GreedyDescent,
                    AvlOnly,
                )
                .unwrap()
            },
            |idx| black_box(build(idx, &rects).height()),
            BatchSize::SmallInput,
        );
    });
    let cubes = gen_random_cubes(4096, 1000.0, 8.0);
    group.bench_function("random_cubes_3d", |b| {
        b.iter_batched(
            || DynamicBvh::<f64, u32>::new(3, 2, 1.0).unwrap(),
            |idx| black_box(build(idx, &cubes).height()),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_update_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_churn");
    let rects = gen_random_rects(4096, 2000.0, 12.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    for tolerance in [1.0, 1.5, 3.0] {
        group.bench_function(format!("jitter_tol{tolerance}"), |b| {
            b.iter_batched(
                || build(DynamicBvh::<f64, u32>::new(2, 2, tolerance).unwrap(), &rects),
                |mut idx| {
                    for (j, r) in rects.iter().enumerate() {
                        let dx = (j % 5) as f64 - 2.0;
                        let dy = ((j * 7) % 5) as f64 - 2.0;
                        let moved = xywh(r.min()[0] + dx, r.min()[1] + dy, 12.0, 12.0);
                        let _ = idx.update(j as u32, moved);
                    }
                    black_box(idx.stats());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_query_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_heavy");
    let rects = gen_grid_rects(128, 8.0);
    let bvh = build(DynamicBvh::<f64, u32>::new(2, 4, 1.0).unwrap(), &rects);
    let flat = build(FlatScan::<f64, u32>::new(2).unwrap(), &rects);
    let queries: Vec<Aabb<f64>> = (0..256)
        .map(|q| xywh((q % 64) as f64 * 8.0, (q / 64) as f64 * 64.0, 64.0, 64.0))
        .collect();
    let rays: Vec<Ray<f64>> = (0..256)
        .map(|q| Ray::new([-1.0, q as f64 * 4.0], [1.0, 0.25]))
        .collect();

    group.bench_function("bvh_broad_phase", |b| {
        b.iter(|| {
            let total: usize = queries
                .iter()
                .map(|q| bvh.broad_phase(q).unwrap().len())
                .sum();
            black_box(total)
        });
    });
    group.bench_function("flat_scan_broad_phase", |b| {
        b.iter(|| {
            let total: usize = queries
                .iter()
                .map(|q| flat.broad_phase(q).unwrap().len())
                .sum();
            black_box(total)
        });
    });
    group.bench_function("bvh_raycast", |b| {
        b.iter(|| {
            let total: usize = rays.iter().map(|r| bvh.raycast(r).unwrap().len()).sum();
            black_box(total)
        });
    });
    group.bench_function("bvh_visit_pruned", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for q in &queries {
                bvh.visit_pruned(|b| !b.intersects(q), |_| total += 1);
            }
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_update_churn, bench_query_heavy);
criterion_main!(benches);
