// mlodato, 20260928

extern crate broadphase2d;

extern crate bincode;
extern crate cgmath;
extern crate rand;
extern crate rand_chacha;

#[macro_use]
extern crate serde;

use broadphase2d::{Body, Bounds, Circle, Polygon, Ray, Rectangle};
use cgmath::{Point2, Rad, Vector2};
use rand::prelude::*;
use rand_chacha::ChaChaRng;

use std::fs::File;
use std::path::Path;

pub type ID = u32;

const FORMAT_SIGNATURE: [u8;8] = *b"BR2SCENE";
const FORMAT_VERSION: (u16, u16) = (2, 0);

#[derive(Deserialize, Serialize)]
struct Header {
    signature: [u8;8],
    version: (u16, u16)
}

/// A recorded set of bodies plus the AABB and ray queries to run against them
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Scene {
    pub system_bounds: Bounds<Point2<f64>>,
    pub bodies: Vec<Body<f64>>,
    pub queries: Vec<Bounds<Point2<f64>>>,
    pub rays: Vec<(Ray<f64>, f64)>
}

/// Parameters for [`Scene::generate`]
#[derive(Copy, Clone, Debug)]
pub struct SceneParams {
    pub seed: u64,
    pub count: usize,
    pub size_range: (f64, f64),
    pub system_bounds: Bounds<Point2<f64>>,
    pub max_fixtures: usize,
    pub queries: usize
}

impl Default for SceneParams {
    fn default() -> Self {
        Self{
            seed: 0,
            count: 1000,
            size_range: (0.5, 4.0),
            system_bounds: Bounds::from_coords(-100.0, -100.0, 100.0, 100.0),
            max_fixtures: 3,
            queries: 16
        }
    }
}

#[derive(Debug)]
pub enum SceneIOError {
    IOError(std::io::Error),
    BincodeError(bincode::Error),
    InvalidSignature([u8;8]),
    InvalidVersion((u16, u16))
}

fn random_point(rng: &mut ChaChaRng, bounds: &Bounds<Point2<f64>>) -> Point2<f64> {
    Point2::new(
        rng.gen_range(bounds.min.x, bounds.max.x),
        rng.gen_range(bounds.min.y, bounds.max.y))
}

fn random_body(rng: &mut ChaChaRng, id: ID, params: &SceneParams) -> Body<f64> {
    let (min_size, max_size) = params.size_range;
    let position = random_point(rng, &params.system_bounds);
    let mut body = Body::at(id, position.x, position.y);
    body.transform.set_rotation(Rad(rng.gen_range(0.0, std::f64::consts::PI * 2.0)));

    let fixtures = rng.gen_range(1, params.max_fixtures.max(1) + 1);
    for _ in 0..fixtures {
        let size = rng.gen_range(min_size, max_size);
        let offset = Point2::new(
            rng.gen_range(-max_size, max_size),
            rng.gen_range(-max_size, max_size));
        match rng.gen_range(0, 3) {
            0 => body.add_fixture(Circle::with_center(offset, size / 2.0)),
            1 => body.add_fixture(Rectangle::with_center(offset, size, rng.gen_range(min_size, max_size))),
            _ => body.add_fixture(Polygon{vertices: vec![
                offset,
                offset + Vector2::new(size, 0.0),
                offset + Vector2::new(0.0, size)]})
        };
    }
    body
}

impl Scene {
    /// Deterministically generates a scene from `params.seed`
    pub fn generate(params: &SceneParams) -> Scene {
        let mut rng = ChaChaRng::seed_from_u64(params.seed);
        let bodies = (0..params.count)
            .map(|id| random_body(&mut rng, id as ID, params))
            .collect();

        let extent = params.size_range.1 * 8.0;
        let queries = (0..params.queries)
            .map(|_| {
                let min = random_point(&mut rng, &params.system_bounds);
                Bounds::from_points(min, min + Vector2::new(
                    rng.gen_range(0.0, extent),
                    rng.gen_range(0.0, extent)))
            })
            .collect();

        let rays = (0..params.queries)
            .map(|_| {
                let origin = random_point(&mut rng, &params.system_bounds);
                let ray = Ray::from_angle(origin, Rad(rng.gen_range(0.0, std::f64::consts::PI * 2.0)));
                let length = if rng.gen_bool(0.25) { 0.0 } else { rng.gen_range(1.0, 100.0) };
                (ray, length)
            })
            .collect();

        Scene{system_bounds: params.system_bounds, bodies, queries, rays}
    }

    /// Moves every body by up to `distance` along each axis
    pub fn jitter(&mut self, seed: u64, distance: f64) {
        let mut rng = ChaChaRng::seed_from_u64(seed);
        for body in &mut self.bodies {
            body.translate(Vector2::new(
                rng.gen_range(-distance, distance),
                rng.gen_range(-distance, distance)));
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene, SceneIOError> {
        let f = File::open(path)
            .map_err(|err| SceneIOError::IOError(err))?;

        let header: Header = bincode::deserialize_from(&f)
            .map_err(|err| SceneIOError::BincodeError(err))?;

        if header.signature != FORMAT_SIGNATURE {
            return Err(SceneIOError::InvalidSignature(header.signature));
        }

        if header.version.0 != FORMAT_VERSION.0 {
            return Err(SceneIOError::InvalidVersion(header.version));
        }

        bincode::deserialize_from::<_, Scene>(f)
            .map_err(|err| SceneIOError::BincodeError(err))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneIOError> {
        let f = File::create(path)
            .map_err(|err| SceneIOError::IOError(err))?;

        bincode::serialize_into(&f, &Header{
            signature: FORMAT_SIGNATURE,
            version: FORMAT_VERSION
        }).map_err(|err| SceneIOError::BincodeError(err))?;

        bincode::serialize_into(f, self)
            .map_err(|err| SceneIOError::BincodeError(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let params = SceneParams{count: 50, ..SceneParams::default()};
        let a = Scene::generate(&params);
        let b = Scene::generate(&params);
        assert_eq!(a, b);
        assert_eq!(a.bodies.len(), 50);
        assert!(a.bodies.iter().all(|body| !body.fixtures.is_empty() && body.fixtures.len() <= 3));
        assert_ne!(a, Scene::generate(&SceneParams{seed: 1, ..params}));
    }

    #[test]
    fn save_and_load() {
        let scene = Scene::generate(&SceneParams{count: 20, ..SceneParams::default()});
        let mut path = std::env::temp_dir();
        path.push(format!("broadphase2d_data-{}.br2_scene", std::process::id()));
        scene.save(&path).unwrap();
        let loaded = Scene::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(scene, loaded);
    }
}
