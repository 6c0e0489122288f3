// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dbvh::{Aabb, DynamicBvh};

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb::new([x0, y0], [x0 + cell, y0 + cell]));
        }
    }
    out
}

type Entry = GeomWithData<Rectangle<[f64; 2]>, u32>;

fn to_rstar(r: &Aabb<f64>, id: u32) -> Entry {
    GeomWithData::new(
        Rectangle::from_corners([r.min()[0], r.min()[1]], [r.max()[0], r.max()[1]]),
        id,
    )
}

fn bench_incremental_vs_rstar(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_compare_f64");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let query = Aabb::new([100.0, 100.0], [500.0, 500.0]);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("dbvh_insert_query_n{n}"), |b| {
            b.iter_batched(
                || DynamicBvh::<f64, u32>::new(2, 4, 1.0).unwrap(),
                |mut idx| {
                    for (i, r) in rects.iter().enumerate() {
                        let _ = idx.insert(i as u32, r.clone());
                    }
                    black_box(idx.broad_phase(&query).unwrap().len());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("rstar_insert_query_n{n}"), |b| {
            b.iter_batched(
                RTree::<Entry>::new,
                |mut tree| {
                    for (i, r) in rects.iter().enumerate() {
                        tree.insert(to_rstar(r, i as u32));
                    }
                    let aabb = AABB::from_corners([100.0, 100.0], [500.0, 500.0]);
                    black_box(tree.locate_in_envelope_intersecting(&aabb).count());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("dbvh_move_all_n{n}"), |b| {
            b.iter_batched(
                || {
                    let mut idx = DynamicBvh::<f64, u32>::new(2, 4, 1.5).unwrap();
                    for (i, r) in rects.iter().enumerate() {
                        let _ = idx.insert(i as u32, r.clone());
                    }
                    idx
                },
                |mut idx| {
                    for (i, r) in rects.iter().enumerate() {
                        let moved = Aabb::new(
                            [r.min()[0] + 1.0, r.min()[1]],
                            [r.max()[0] + 1.0, r.max()[1]],
                        );
                        let _ = idx.update(i as u32, moved);
                    }
                    black_box(idx.len());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("rstar_move_all_n{n}"), |b| {
            b.iter_batched(
                || {
                    let entries: Vec<_> = rects
                        .iter()
                        .enumerate()
                        .map(|(i, r)| to_rstar(r, i as u32))
                        .collect();
                    RTree::bulk_load(entries)
                },
                |mut tree| {
                    for (i, r) in rects.iter().enumerate() {
                        let old = to_rstar(r, i as u32);
                        tree.remove(&old);
                        let moved = Aabb::new(
                            [r.min()[0] + 1.0, r.min()[1]],
                            [r.max()[0] + 1.0, r.max()[1]],
                        );
                        tree.insert(to_rstar(&moved, i as u32));
                    }
                    black_box(tree.size());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_incremental_vs_rstar);
criterion_main!(benches);
