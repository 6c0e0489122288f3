// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized operation sequences checked against the flat-scan reference.
//!
//! The runner seed is pinned so failures reproduce across machines.

use proptest::prelude::*;
use proptest::test_runner::{Config, RngAlgorithm, TestRng, TestRunner};
use understory_dbvh::{
    Aabb, AvlOnly, Balancer, BranchAndBound, BvhConfig, BvhError, DynamicBvh, FlatScan,
    GreedyDescent, Ray, Rotations, SiblingSelector,
};

const SEED: [u8; 32] = [
    0x5d, 0xb7, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0,
];

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, Aabb<f64>),
    Remove(u16),
    Update(u16, Aabb<f64>),
    Churn(u16, Aabb<f64>),
}

fn runner() -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED);
    TestRunner::new_with_rng(Config::with_cases(64), rng)
}

fn aabb(dim: usize) -> impl Strategy<Value = Aabb<f64>> {
    (
        prop::collection::vec(-100.0..100.0_f64, dim),
        prop::collection::vec(0.0..20.0_f64, dim),
    )
        .prop_map(|(min, size)| {
            let max: Vec<f64> = min.iter().zip(&size).map(|(m, s)| m + s).collect();
            Aabb::from_slices(&min, &max).unwrap()
        })
}

fn op(dim: usize) -> impl Strategy<Value = Op> {
    let id = 0..48_u16;
    prop_oneof![
        4 => (id.clone(), aabb(dim)).prop_map(|(i, b)| Op::Insert(i, b)),
        2 => id.clone().prop_map(Op::Remove),
        3 => (id.clone(), aabb(dim)).prop_map(|(i, b)| Op::Update(i, b)),
        1 => (id, aabb(dim)).prop_map(|(i, b)| Op::Churn(i, b)),
    ]
}

fn ray(dim: usize) -> impl Strategy<Value = Ray<f64>> {
    (
        prop::collection::vec(-120.0..120.0_f64, dim),
        prop::collection::vec(-1.0..1.0_f64, dim),
        prop::option::of(1.0..400.0_f64),
    )
        .prop_map(|(origin, dir, max_t)| {
            let r = Ray::from_slices(&origin, &dir).unwrap();
            match max_t {
                Some(t) => r.with_max_t(t),
                None => r,
            }
        })
}

#[derive(Clone, Debug)]
struct Case {
    leaf_size: usize,
    tolerance: f64,
    ops: Vec<Op>,
    queries: Vec<Aabb<f64>>,
    rays: Vec<Ray<f64>>,
}

fn case(dim: usize) -> impl Strategy<Value = Case> {
    (
        1..5_usize,
        prop_oneof![Just(1.0), 1.0..3.0_f64],
        prop::collection::vec(op(dim), 1..160),
        prop::collection::vec(aabb(dim), 1..8),
        prop::collection::vec(ray(dim), 1..8),
    )
        .prop_map(|(leaf_size, tolerance, ops, queries, rays)| Case {
            leaf_size,
            tolerance,
            ops,
            queries,
            rays,
        })
}

fn sorted(mut v: Vec<u16>) -> Vec<u16> {
    v.sort_unstable();
    v
}

/// Apply `case` to a tree and the reference, checking every step.
fn check<S, B>(
    dim: usize,
    case: &Case,
    selector: S,
    balancer: B,
) -> Result<(), TestCaseError>
where
    S: SiblingSelector<f64, u16>,
    B: Balancer<f64, u16>,
{
    let cfg = BvhConfig::new(dim)
        .with_leaf_size(case.leaf_size)
        .with_tolerance(case.tolerance);
    let mut bvh: DynamicBvh<f64, u16, S, B> =
        DynamicBvh::with_policies(cfg, selector, balancer).unwrap();
    let mut flat: FlatScan<f64, u16> = FlatScan::new(dim).unwrap();

    for op in &case.ops {
        match op {
            Op::Insert(id, b) => {
                prop_assert_eq!(bvh.insert(*id, b.clone()), flat.insert(*id, b.clone()));
            }
            Op::Remove(id) => {
                prop_assert_eq!(bvh.remove(*id), flat.remove(*id));
            }
            Op::Update(id, b) => {
                let got = bvh.update(*id, b.clone()).map(|_| ());
                prop_assert_eq!(got, flat.update(*id, b.clone()));
            }
            Op::Churn(id, b) => {
                // Insert then remove leaves the id set unchanged.
                let before: Vec<u16> = bvh.iter().map(|(o, _)| o).collect();
                if bvh.insert(*id, b.clone()).is_ok() {
                    let removed = bvh.remove(*id);
                    prop_assert_eq!(removed.as_ref(), Ok(b));
                } else {
                    prop_assert!(bvh.contains(*id));
                }
                let after: Vec<u16> = bvh.iter().map(|(o, _)| o).collect();
                prop_assert_eq!(before, after);
            }
        }
        if let Err(err) = bvh.validate() {
            return Err(TestCaseError::fail(format!("{err} after {op:?}")));
        }
        prop_assert_eq!(bvh.len(), flat.len());
    }

    for q in &case.queries {
        prop_assert_eq!(sorted(bvh.broad_phase(q).unwrap()), flat.broad_phase(q).unwrap());
        let center = q.center();
        prop_assert_eq!(
            sorted(bvh.query_point(&center).unwrap()),
            flat.query_point(&center).unwrap()
        );
    }
    for r in &case.rays {
        prop_assert_eq!(sorted(bvh.raycast(r).unwrap()), flat.raycast(r).unwrap());
    }
    Ok(())
}

#[test]
fn greedy_rotations_match_reference_2d() {
    runner()
        .run(&case(2), |c| check(2, &c, GreedyDescent, Rotations))
        .unwrap();
}

#[test]
fn greedy_rotations_match_reference_3d() {
    runner()
        .run(&case(3), |c| check(3, &c, GreedyDescent, Rotations))
        .unwrap();
}

#[test]
fn branch_and_bound_matches_reference() {
    runner()
        .run(&case(2), |c| check(2, &c, BranchAndBound::default(), Rotations))
        .unwrap();
}

#[test]
fn avl_only_matches_reference() {
    runner()
        .run(&case(3), |c| check(3, &c, GreedyDescent, AvlOnly))
        .unwrap();
}

#[test]
fn invalid_boxes_never_mutate() {
    runner()
        .run(
            &(prop::collection::vec(aabb(2), 1..40), 0..2_usize),
            |(boxes, axis)| {
                let mut bvh: DynamicBvh<f64, u16> = DynamicBvh::new(2, 2, 1.5).unwrap();
                for (i, b) in boxes.iter().enumerate() {
                    bvh.insert(u16::try_from(i).unwrap(), b.clone()).unwrap();
                }
                let stats = bvh.stats();

                let mut min = [0.0; 2];
                let mut max = [1.0; 2];
                min[axis] = 2.0;
                max[axis] = 1.0;
                let inverted = Aabb::new(min, max);
                prop_assert_eq!(bvh.insert(999, inverted.clone()), Err(BvhError::InvalidAabb));
                prop_assert_eq!(bvh.update(0, inverted), Err(BvhError::InvalidAabb));
                prop_assert_eq!(
                    bvh.update(0, Aabb::new([f64::NAN, 0.0], [1.0, 1.0])),
                    Err(BvhError::InvalidAabb)
                );
                prop_assert_eq!(bvh.stats(), stats);
                prop_assert_eq!(bvh.get(0), Some(&boxes[0]));
                Ok(())
            },
        )
        .unwrap();
}
