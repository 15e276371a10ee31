// mlodato, 20260929

extern crate broadphase2d;
extern crate broadphase2d_data;

extern crate env_logger;

#[macro_use]
extern crate clap;

#[macro_use]
extern crate log;

use broadphase2d::{Algorithm, Body, Bounds, BroadphaseDetector, DefaultFilter, DetectorBuilder};
use broadphase2d_data::{Scene, SceneParams};

use std::collections::BTreeSet;
use std::time::Instant;

trait Command {
    fn name() -> &'static str;
    fn init() -> clap::App<'static, 'static>;
    fn exec(args: &clap::ArgMatches);
}

struct GenScene {}
impl Command for GenScene {
    fn name() -> &'static str { "gen_scene" }
    fn init() -> clap::App<'static, 'static> {
        use clap::Arg;
        clap::SubCommand::with_name(Self::name())
            .about("generate a scene of bodies with random fixtures")
            .arg(Arg::with_name("seed")
                .long("seed")
                .value_name("NUMBER")
                .help("initial state for the random number generator"))
            .arg(Arg::with_name("count")
                .short("n")
                .long("count")
                .value_name("NUMBER")
                .required(true)
                .help("number of bodies in the scene"))
            .arg(Arg::with_name("size_range")
                .short("s")
                .long("size_range")
                .value_names(&["MIN", "MAX"])
                .required(true)
                .help("size range for fixtures"))
            .arg(Arg::with_name("bounds")
                .short("b")
                .long("bounds")
                .value_names(&["X0", "Y0", "X1", "Y1"])
                .required(true)
                .help("system bounds"))
            .arg(Arg::with_name("queries")
                .short("q")
                .long("queries")
                .value_name("NUMBER")
                .help("number of AABB and ray queries"))
            .arg(Arg::with_name("out_path")
                .short("o")
                .long("out")
                .value_name("PATH")
                .required(true)
                .help("where to write output"))
    }

    fn exec(args: &clap::ArgMatches) {
        let count = value_t!(args, "count", usize)
            .expect("failed to get count");
        let size_range = values_t!(args, "size_range", f64)
            .expect("failed to get size_range");
        let system_bounds = values_t!(args, "bounds", f64)
            .expect("failed to get bounds");

        let defaults = SceneParams::default();
        let params = SceneParams{
            seed: value_t!(args, "seed", u64).unwrap_or(defaults.seed),
            count,
            size_range: (size_range[0], size_range[1]),
            system_bounds: Bounds::from_coords(
                system_bounds[0],
                system_bounds[1],
                system_bounds[2],
                system_bounds[3]),
            queries: value_t!(args, "queries", usize).unwrap_or(defaults.queries),
            ..defaults
        };

        let scene = Scene::generate(&params);
        scene.save(args.value_of("out_path")
            .expect("no output path specified"))
            .expect("failed to write output");
        info!("wrote {} bodies", scene.bodies.len());
    }
}

struct ShowScene {}
impl Command for ShowScene {
    fn name() -> &'static str { "show_scene" }
    fn init() -> clap::App<'static, 'static> {
        use clap::Arg;
        clap::SubCommand::with_name(Self::name())
            .about("print the bodies of a scene")
            .arg(Arg::with_name("in_path")
                .short("i")
                .long("in")
                .value_name("PATH")
                .required(true)
                .help("path to a scene generated with gen_scene"))
    }

    fn exec(args: &clap::ArgMatches) {
        let scene = Scene::load(args.value_of("in_path")
            .expect("no input path specified"))
            .expect("failed to read input");

        let detector = DetectorBuilder::new()
            .build_brute_force::<Body<f64>>()
            .expect("failed to build detector");

        println!("system_bounds: {:?}", scene.system_bounds);
        println!("bodies:");
        for body in &scene.bodies {
            let bounds = detector.bounds(body);
            println!("\tid: {:5}, fixtures: {}, bounds: <{:8.3}, {:8.3}> <{:8.3}, {:8.3}>",
                body.id,
                body.fixtures.len(),
                bounds.min.x,
                bounds.min.y,
                bounds.max.x,
                bounds.max.y);
        }
    }
}

struct Compare {}
impl Command for Compare {
    fn name() -> &'static str { "compare" }
    fn init() -> clap::App<'static, 'static> {
        use clap::Arg;
        clap::SubCommand::with_name(Self::name())
            .about("run every detector over a scene and compare results against brute force")
            .arg(Arg::with_name("in_path")
                .short("i")
                .long("in")
                .value_name("PATH")
                .required(true)
                .help("path to a scene generated with gen_scene"))
            .arg(Arg::with_name("steps")
                .long("steps")
                .value_name("NUMBER")
                .help("number of jittered steps to simulate"))
            .arg(Arg::with_name("expansion")
                .short("e")
                .long("expansion")
                .value_name("NUMBER")
                .help("AABB expansion for detectors which support it"))
            .arg(Arg::with_name("algorithm")
                .short("a")
                .long("algorithm")
                .value_name("NAME")
                .multiple(true)
                .help("only run the named detectors (brute_force, dynamic_tree, sap, lazy_tree)"))
    }

    fn exec(args: &clap::ArgMatches) {
        let scene = Scene::load(args.value_of("in_path")
            .expect("no input path specified"))
            .expect("failed to read input");
        let steps = value_t!(args, "steps", u64).unwrap_or(1);

        let mut builder = DetectorBuilder::new();
        builder.with_capacity(scene.bodies.len() * 2);
        if let Ok(expansion) = value_t!(args, "expansion", f64) {
            builder.with_expansion(expansion);
        }

        let algorithms: Vec<Algorithm> = match args.values_of("algorithm") {
            Some(names) => names
                .map(|name| name.parse().expect("unknown algorithm"))
                .collect(),
            None => Algorithm::ALL.to_vec()
        };

        let mut oracle = builder.build_brute_force::<Body<f64>>()
            .expect("failed to build detector");
        let mut detectors: Vec<(Algorithm, Box<dyn BroadphaseDetector<Body<f64>>>)> = algorithms.iter()
            .map(|&algorithm| (algorithm, builder.build(algorithm).expect("failed to build detector")))
            .collect();

        let mut scene = scene;
        for step in 0..steps {
            if step > 0 {
                scene.jitter(step, 0.1);
            }
            for body in &scene.bodies {
                oracle.update(body);
            }
            let expected: BTreeSet<_> = oracle.detect(&DefaultFilter).into_iter()
                .map(|pair| pair.unordered())
                .collect();

            for (algorithm, detector) in &mut detectors {
                let start = Instant::now();
                for body in &scene.bodies {
                    detector.update(body);
                }
                let updated = start.elapsed();
                let actual: BTreeSet<_> = detector.detect(&DefaultFilter).into_iter()
                    .map(|pair| pair.unordered())
                    .collect();
                let detected = start.elapsed() - updated;

                let missing = expected.difference(&actual).count();
                println!("step {:4} {:>12}: update {:10.3?} detect {:10.3?} pairs {:8} missing {}",
                    step, algorithm, updated, detected, actual.len(), missing);
                if missing > 0 {
                    error!("{} missed {} pairs reported by brute force", algorithm, missing);
                }
            }
        }

        for (algorithm, detector) in &mut detectors {
            let start = Instant::now();
            let mut items = 0;
            for query in &scene.queries {
                items += detector.detect_bounds(query, &DefaultFilter).len();
            }
            for (ray, length) in &scene.rays {
                items += detector.raycast(ray, *length, &DefaultFilter).len();
            }
            println!("{:>12}: {} queries {:10.3?} items {}",
                algorithm, scene.queries.len() + scene.rays.len(), start.elapsed(), items);
        }
    }
}

macro_rules! app_cmds {
    (app $app: expr; $(cmd $cmd: ident)*) => {
        {
            let mut app = $app as clap::App;
            $(
                app = app.subcommand(<$cmd as Command>::init());
            )*
            let matches = app.get_matches();
            $(
                if let Some(matches) = matches.subcommand_matches(<$cmd as Command>::name()) {
                    <$cmd as Command>::exec(matches);
                }
            )*
        }
    };
}

fn main() {
    env_logger::init();
    app_cmds!{
        app clap::App::new("gen_test_data")
            .version("0.2.0");
        cmd GenScene
        cmd ShowScene
        cmd Compare
    };
}
