extern crate broadphase2d;
extern crate broadphase2d_data;
extern crate env_logger;
extern crate itertools;

#[macro_use]
extern crate lazy_static;

use broadphase2d::{
    Algorithm,
    BatchBroadphaseDetector,
    Body,
    BroadphaseDetector,
    BroadphasePair,
    Collidable,
    DefaultFilter,
    DetectorBuilder,
    LazyTree};
use broadphase2d_data::{Scene, SceneParams};
use itertools::Itertools;

use std::collections::BTreeSet;

type Detector = Box<dyn BroadphaseDetector<Body<f64>>>;
type PairSet = BTreeSet<BroadphasePair<u32, u32>>;

lazy_static! {
    static ref SCENE: Scene = Scene::generate(&SceneParams{
        seed: 7,
        count: 400,
        ..SceneParams::default()
    });
}

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}

fn build(algorithm: Algorithm) -> Detector {
    DetectorBuilder::new()
        .with_capacity(SCENE.bodies.len() * 2)
        .build(algorithm)
        .expect("failed to build detector")
}

fn collect_pairs(detector: &mut Detector) -> PairSet {
    detector.detect(&DefaultFilter).into_iter()
        .map(|pair| pair.unordered())
        .collect()
}

/// Every overlapping pair of fixtures on distinct bodies, without any index
fn exhaustive_pairs(bodies: &[Body<f64>]) -> PairSet {
    bodies.iter()
        .flat_map(|body| body.fixtures.iter()
            .map(move |fixture| (body.key(fixture), body.fixture_bounds(fixture))))
        .tuple_combinations()
        .filter(|((a, a_bounds), (b, b_bounds))| a.collidable != b.collidable && a_bounds.overlaps(b_bounds))
        .map(|((a, _), (b, _))| BroadphasePair::new(a, b).unordered())
        .collect()
}

#[test]
fn brute_force_matches_exhaustive_search() {
    init_logger();
    let mut detector = build(Algorithm::BruteForce);
    for body in &SCENE.bodies {
        detector.add(body);
    }
    let expected = exhaustive_pairs(&SCENE.bodies);
    assert!(!expected.is_empty());
    assert_eq!(collect_pairs(&mut detector), expected);
}

#[test]
fn detectors_agree_over_jittered_steps() {
    init_logger();
    let mut scene = SCENE.clone();
    let mut oracle = build(Algorithm::BruteForce);
    let mut detectors = Algorithm::ALL.iter()
        .filter(|&&algorithm| algorithm != Algorithm::BruteForce)
        .map(|&algorithm| (algorithm, build(algorithm)))
        .collect_vec();

    for step in 0..8 {
        if step > 0 {
            scene.jitter(step, 0.25);
        }
        for body in &scene.bodies {
            oracle.update(body);
            for (_, detector) in detectors.iter_mut() {
                detector.update(body);
            }
        }

        let expected = collect_pairs(&mut oracle);
        for (algorithm, detector) in detectors.iter_mut() {
            let actual = collect_pairs(detector);
            assert!(actual.is_superset(&expected), "{} missed pairs at step {}", algorithm, step);
            if !detector.supports_expansion() {
                assert_eq!(actual, expected, "{} at step {}", algorithm, step);
            }
            assert_eq!(detector.validate(), Ok(()), "{} at step {}", algorithm, step);
        }
    }
}

#[test]
fn queries_agree() {
    init_logger();
    let mut oracle = build(Algorithm::BruteForce);
    let mut detectors = Algorithm::ALL.iter()
        .map(|&algorithm| (algorithm, build(algorithm)))
        .collect_vec();
    for body in &SCENE.bodies {
        oracle.add(body);
        for (_, detector) in detectors.iter_mut() {
            detector.add(body);
        }
    }

    for query in &SCENE.queries {
        let expected: BTreeSet<_> = oracle.detect_bounds(query, &DefaultFilter).into_iter().collect();
        for (algorithm, detector) in detectors.iter_mut() {
            let actual: BTreeSet<_> = detector.detect_bounds(query, &DefaultFilter).into_iter().collect();
            assert!(actual.is_superset(&expected), "{}: {:?}", algorithm, query);
            if !detector.supports_expansion() {
                assert_eq!(actual, expected, "{}: {:?}", algorithm, query);
            }
        }
    }

    for (ray, length) in &SCENE.rays {
        let expected: BTreeSet<_> = oracle.raycast(ray, *length, &DefaultFilter).into_iter().collect();
        for (algorithm, detector) in detectors.iter_mut() {
            let actual: BTreeSet<_> = detector.raycast(ray, *length, &DefaultFilter).into_iter().collect();
            assert!(actual.is_superset(&expected), "{}: {:?} {}", algorithm, ray, length);
        }
    }
}

#[test]
fn lazy_tree_batch_update() {
    init_logger();
    let mut scene = SCENE.clone();
    let mut oracle = build(Algorithm::BruteForce);
    let mut lazy: LazyTree<Body<f64>> = LazyTree::with_capacity(scene.bodies.len() * 2);

    for step in 0..4 {
        scene.jitter(100 + step, 1.0);
        lazy.batch_update(&scene.bodies);
        for body in &scene.bodies {
            oracle.update(body);
        }
        let expected = collect_pairs(&mut oracle);
        let actual: PairSet = lazy.detect(&DefaultFilter).into_iter()
            .map(|pair| pair.unordered())
            .collect();
        assert_eq!(actual, expected, "step {}", step);
        assert_eq!(lazy.len(), oracle.len());
        assert_eq!(lazy.validate(), Ok(()));
    }
}

#[test]
fn removing_half_the_scene() {
    init_logger();
    for &algorithm in Algorithm::ALL.iter() {
        let mut detector = build(algorithm);
        for body in &SCENE.bodies {
            detector.add(body);
        }
        let (kept, removed): (Vec<_>, Vec<_>) = SCENE.bodies.iter().partition(|body| body.id % 2 == 0);
        for body in &removed {
            assert!(detector.remove(body), "{}", algorithm);
        }
        assert_eq!(detector.validate(), Ok(()), "{}", algorithm);
        assert_eq!(detector.len(), kept.iter().map(|body| body.fixtures.len()).sum::<usize>(), "{}", algorithm);

        let remaining = kept.iter().map(|&body| body.clone()).collect_vec();
        let expected = exhaustive_pairs(&remaining);
        let actual = collect_pairs(&mut detector);
        assert!(actual.is_superset(&expected), "{}", algorithm);
        assert!(actual.iter().all(|pair| pair.first.collidable % 2 == 0 && pair.second.collidable % 2 == 0),
            "{}", algorithm);
    }
}
