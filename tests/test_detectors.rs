extern crate broadphase2d;
extern crate cgmath;
extern crate env_logger;

use broadphase2d::{
    Algorithm,
    Body,
    Bounds,
    BroadphaseDetector,
    BroadphasePair,
    Circle,
    Collidable,
    DefaultFilter,
    DetectorBuilder,
    ItemFilter,
    Key,
    PairFilter,
    Ray,
    Rectangle};
use cgmath::{Point2, Vector2};

type Detector = Box<dyn BroadphaseDetector<Body<f64>>>;

fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}

fn detectors() -> Vec<(Algorithm, Detector)> {
    init_logger();
    Algorithm::ALL.iter()
        .map(|&algorithm| (algorithm, DetectorBuilder::new()
            .build(algorithm)
            .expect("failed to build detector")))
        .collect()
}

fn circle(id: u32, x: f64, y: f64) -> Body<f64> {
    Body::at(id, x, y).with_fixture(Circle::new(1.0))
}

fn unordered(pairs: Vec<BroadphasePair<u32, u32>>) -> Vec<BroadphasePair<u32, u32>> {
    let mut pairs: Vec<_> = pairs.into_iter().map(|pair| pair.unordered()).collect();
    pairs.sort();
    pairs
}

#[test]
fn separated_circles_do_not_collide() {
    for (algorithm, mut detector) in detectors() {
        detector.add(&circle(0, 0.0, 0.0));
        detector.add(&circle(1, 5.0, 0.0));
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
    }
}

#[test]
fn moved_circle_collides_then_removal_clears() {
    for (algorithm, mut detector) in detectors() {
        let a = circle(0, 0.0, 0.0);
        let mut b = circle(1, 5.0, 0.0);
        detector.add(&a);
        detector.add(&b);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);

        b.set_position(1.5, 0.0);
        detector.update(&b);
        let pairs = unordered(detector.detect(&DefaultFilter));
        let expected = BroadphasePair::new(a.key(&a.fixtures[0]), b.key(&b.fixtures[0])).unordered();
        assert_eq!(pairs, vec![expected], "{}", algorithm);

        assert!(detector.remove(&b), "{}", algorithm);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
        assert_eq!(detector.len(), 1, "{}", algorithm);
        assert!(!detector.contains(&b), "{}", algorithm);
        assert!(detector.contains(&a), "{}", algorithm);
        assert_eq!(detector.validate(), Ok(()), "{}", algorithm);
    }
}

#[test]
fn aabb_query() {
    for (algorithm, mut detector) in detectors() {
        for (id, &x) in [0.0, 10.0, 20.0].iter().enumerate() {
            detector.add(&Body::at(id as u32, x + 0.5, 0.5).with_fixture(Rectangle::new(1.0, 1.0)));
        }

        let mut all: Vec<u32> = detector
            .detect_bounds(&Bounds::from_coords(-100.0, -100.0, 100.0, 100.0), &DefaultFilter)
            .into_iter()
            .map(|item| item.collidable)
            .collect();
        all.sort();
        assert_eq!(all, vec![0, 1, 2], "{}", algorithm);

        let none = detector.detect_bounds(&Bounds::from_coords(5.0, -1.0, 6.0, 1.0), &DefaultFilter);
        assert!(none.is_empty(), "{}", algorithm);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
    }
}

#[test]
fn raycast() {
    for (algorithm, mut detector) in detectors() {
        let target = Body::at(7, 1.0, 1.0).with_fixture(Rectangle::new(2.0, 2.0));
        detector.add(&target);

        let hit = Ray::new(Point2::new(-5.0, 1.0), Vector2::new(1.0, 0.0)).unwrap();
        let items = detector.raycast(&hit, 20.0, &DefaultFilter);
        assert_eq!(items, vec![target.key(&target.fixtures[0])], "{}", algorithm);
        assert_eq!(detector.raycast(&hit, 0.0, &DefaultFilter).len(), 1, "{}", algorithm);
        assert!(detector.raycast(&hit, 3.0, &DefaultFilter).is_empty(), "{}", algorithm);

        let miss = Ray::new(Point2::new(-5.0, 5.0), Vector2::new(1.0, 0.0)).unwrap();
        assert!(detector.raycast(&miss, 20.0, &DefaultFilter).is_empty(), "{}", algorithm);

        let behind = Ray::new(Point2::new(5.0, 1.0), Vector2::new(1.0, 0.0)).unwrap();
        assert!(detector.raycast(&behind, 0.0, &DefaultFilter).is_empty(), "{}", algorithm);

        let diagonal = Ray::new(Point2::new(-3.0, -3.0), Vector2::new(1.0, 1.0)).unwrap();
        assert_eq!(detector.raycast(&diagonal, 0.0, &DefaultFilter).len(), 1, "{}", algorithm);
    }
}

#[test]
fn add_then_remove_restores_state() {
    for (algorithm, mut detector) in detectors() {
        let resident = circle(0, 0.0, 0.0);
        detector.add(&resident);
        let visitor = Body::at(1, 0.5, 0.0)
            .with_fixture(Circle::new(1.0))
            .with_fixture(Rectangle::new(1.0, 3.0));

        detector.add(&visitor);
        assert!(detector.contains(&visitor), "{}", algorithm);
        assert_eq!(detector.len(), 3, "{}", algorithm);
        assert!(detector.remove(&visitor), "{}", algorithm);
        assert!(!detector.remove(&visitor), "{}", algorithm);

        assert_eq!(detector.len(), 1, "{}", algorithm);
        assert!(!detector.contains(&visitor), "{}", algorithm);
        assert!(detector.contains(&resident), "{}", algorithm);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
    }
}

#[test]
fn add_of_present_fixture_updates_it() {
    for (algorithm, mut detector) in detectors() {
        let mut body = circle(0, 0.0, 0.0);
        let other = circle(1, 10.0, 0.0);
        detector.add(&body);
        detector.add(&other);

        body.set_position(10.0, 1.0);
        detector.add(&body);
        assert_eq!(detector.len(), 2, "{}", algorithm);
        assert_eq!(detector.detect(&DefaultFilter).len(), 1, "{}", algorithm);
    }
}

#[test]
fn bounds_fall_back_to_fresh_bounds() {
    for (algorithm, mut detector) in detectors() {
        let indexed = circle(0, 0.0, 0.0);
        let absent = circle(1, 3.0, 0.0);
        detector.add(&indexed);

        let expansion = detector.expansion();
        let half = 1.0 + expansion / 2.0;
        assert_eq!(detector.bounds(&indexed), Bounds::from_coords(-half, -half, half, half), "{}", algorithm);
        assert_eq!(detector.bounds(&absent), Bounds::from_coords(2.0, -1.0, 4.0, 1.0), "{}", algorithm);
        assert!(!detector.contains(&absent), "{}", algorithm);
        assert!(!detector.is_empty(), "{}", algorithm);
    }
}

#[test]
fn expansion_support() {
    for (algorithm, mut detector) in detectors() {
        let supported = detector.supports_expansion();
        assert_eq!(
            supported,
            algorithm == Algorithm::DynamicTree || algorithm == Algorithm::SweepAndPrune,
            "{}", algorithm);
        assert!(detector.set_expansion(0.5).is_ok(), "{}", algorithm);
        assert!(detector.set_expansion(-0.5).is_err(), "{}", algorithm);
        if supported {
            assert_eq!(detector.expansion(), 0.5, "{}", algorithm);
        } else {
            assert_eq!(detector.expansion(), 0.0, "{}", algorithm);
        }
    }
}

#[test]
fn multi_fixture_bodies_do_not_self_collide() {
    for (algorithm, mut detector) in detectors() {
        let compound = Body::at(0, 0.0, 0.0)
            .with_fixture(Circle::new(1.0))
            .with_fixture(Rectangle::new(2.0, 2.0))
            .with_fixture(Circle::with_center(Point2::new(0.5, 0.0), 1.0));
        detector.add(&compound);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);

        detector.add(&circle(1, 0.0, 0.0));
        assert_eq!(detector.detect(&DefaultFilter).len(), 3, "{}", algorithm);
    }
}

#[test]
fn filters() {
    for (algorithm, mut detector) in detectors() {
        for id in 0..4 {
            detector.add(&circle(id, id as f64 * 0.5, 0.0));
        }
        assert_eq!(detector.detect(&DefaultFilter).len(), 6, "{}", algorithm);

        let no_zero = PairFilter(|a: &Key<Body<f64>>, b: &Key<Body<f64>>| a.collidable != 0 && b.collidable != 0);
        assert_eq!(detector.detect(&no_zero).len(), 3, "{}", algorithm);

        let even = ItemFilter(|item: &Key<Body<f64>>| item.collidable % 2 == 0);
        let query = Bounds::from_coords(-10.0, -10.0, 10.0, 10.0);
        assert_eq!(detector.detect_bounds(&query, &even).len(), 2, "{}", algorithm);
        let ray = Ray::new(Point2::new(-10.0, 0.0), Vector2::new(1.0, 0.0)).unwrap();
        assert_eq!(detector.raycast(&ray, 0.0, &even).len(), 2, "{}", algorithm);
    }
}

#[test]
fn shift_moves_everything() {
    for (algorithm, mut detector) in detectors() {
        for id in 0..8 {
            detector.add(&circle(id, id as f64 * 3.0, 0.0));
        }
        detector.shift(Vector2::new(100.0, -50.0));
        let near_origin = detector.detect_bounds(&Bounds::from_coords(-5.0, -5.0, 30.0, 5.0), &DefaultFilter);
        assert!(near_origin.is_empty(), "{}", algorithm);
        let shifted = detector.detect_bounds(&Bounds::from_coords(95.0, -55.0, 130.0, -45.0), &DefaultFilter);
        assert_eq!(shifted.len(), 8, "{}", algorithm);
        assert_eq!(detector.validate(), Ok(()), "{}", algorithm);
    }
}

#[test]
fn clear() {
    for (algorithm, mut detector) in detectors() {
        for id in 0..8 {
            detector.add(&circle(id, 0.0, id as f64));
        }
        assert!(!detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
        detector.clear();
        assert!(detector.is_empty(), "{}", algorithm);
        assert!(detector.detect(&DefaultFilter).is_empty(), "{}", algorithm);
        assert!(!detector.contains(&circle(0, 0.0, 0.0)), "{}", algorithm);

        detector.add(&circle(0, 0.0, 0.0));
        detector.add(&circle(1, 0.0, 1.0));
        assert_eq!(detector.detect(&DefaultFilter).len(), 1, "{}", algorithm);
    }
}

#[test]
fn huge_fixture_in_populated_index() {
    for (algorithm, mut detector) in detectors() {
        for id in 0..64u32 {
            detector.add(&circle(id, (id % 8) as f64 * 3.0, (id / 8) as f64 * 3.0));
        }
        let huge = Body::at(64, 10.0, 10.0).with_fixture(Rectangle::new(500.0, 500.0));
        detector.add(&huge);
        assert_eq!(detector.validate(), Ok(()), "{}", algorithm);
        assert_eq!(detector.detect(&DefaultFilter).len(), 64, "{}", algorithm);
        assert!(detector.remove(&huge), "{}", algorithm);
        assert_eq!(detector.validate(), Ok(()), "{}", algorithm);
    }
}

#[test]
fn detached_fixture_keeps_its_own_key() {
    for (algorithm, mut detector) in detectors() {
        let mut body = Body::at(0, 0.0, 0.0)
            .with_fixture(Circle::new(1.0))
            .with_fixture(Circle::new(2.0));
        detector.add(&body);

        let detached = body.remove_fixture(1).unwrap();
        let id = body.add_fixture(Circle::new(0.5));
        let fresh = body.fixture(id).unwrap().clone();
        assert!(!detector.contains_fixture(&body, &fresh), "{}", algorithm);

        detector.update(&body);
        assert_eq!(detector.len(), 3, "{}", algorithm);
        assert!(detector.remove_fixture(&body, &detached), "{}", algorithm);
        assert!(detector.contains_fixture(&body, &fresh), "{}", algorithm);
        assert!(detector.contains(&body), "{}", algorithm);
        assert_eq!(detector.len(), 2, "{}", algorithm);
    }
}
