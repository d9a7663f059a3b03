// Histories must not depend on how they are spread across threads

use collision_tables::{
    EnergyGrid, FastRng, HashBasedGridSearcher, HashScale, Interpolation, Particle, ParticleBank,
    ParticleType, Reaction, ReactionKind, ReactionSet, SamplingPolicy, TabularDistribution,
    TabularSecondaryDistribution, ThresholdIndexedTable,
};
use std::sync::Arc;
use std::thread;

const CUTOFF: f64 = 1e-3;
const MAX_COLLISIONS: u32 = 500;

fn reaction_set() -> ReactionSet {
    let grid = EnergyGrid::new(vec![1e-3, 1e-2, 1e-1, 1.0, 10.0]).unwrap();
    let searcher = Arc::new(HashBasedGridSearcher::new(grid, 2, HashScale::Logarithmic).unwrap());
    let table = |threshold: usize, values: Vec<f64>| {
        Arc::new(
            ThresholdIndexedTable::with_searcher(
                searcher.clone(),
                threshold,
                values,
                Interpolation::LogLog,
            )
            .unwrap(),
        )
    };

    let cosines = TabularSecondaryDistribution::with_policy(
        vec![1e-3, 10.0],
        vec![
            TabularDistribution::lin_lin(vec![-1.0, 1.0], vec![1.0, 1.0]).unwrap(),
            TabularDistribution::lin_lin(vec![-1.0, 0.9, 1.0], vec![0.1, 1.0, 8.0]).unwrap(),
        ],
        SamplingPolicy::Correlated,
    )
    .unwrap();
    let losses = TabularSecondaryDistribution::with_policy(
        vec![1e-3, 1.0, 10.0],
        vec![
            TabularDistribution::lin_lin(vec![1e-5, 1e-4, 5e-4], vec![4.0, 2.0, 1.0]).unwrap(),
            TabularDistribution::lin_lin(vec![1e-5, 1e-3, 1e-1], vec![3.0, 1.0, 0.1]).unwrap(),
            TabularDistribution::from_cdf(vec![1e-5, 1e-2, 2.0], vec![0.0, 0.7, 1.0]).unwrap(),
        ],
        SamplingPolicy::UnitBaseCorrelated,
    )
    .unwrap();

    vec![
        Reaction::new(
            ReactionKind::ElasticScatter,
            table(0, vec![5e8, 8e7, 1e7, 2e6, 4e5]),
            Some(Arc::new(cosines)),
        )
        .unwrap(),
        Reaction::new(
            ReactionKind::AtomicExcitation,
            table(0, vec![1e8, 6e7, 2e7, 8e6, 3e6]),
            Some(Arc::new(losses)),
        )
        .unwrap(),
        Reaction::new(ReactionKind::Absorption, table(2, vec![1e5, 4e5, 6e5]), None).unwrap(),
    ]
    .into_iter()
    .collect()
}

fn run_history(set: &ReactionSet, seed: u64, history: u64) -> Particle {
    let mut rng = FastRng::for_history(seed, history);
    let mut bank = ParticleBank::new();
    let mut particle = Particle::new(ParticleType::Electron, [0.0; 3], [0.0, 0.0, 1.0], 5.0);
    while particle.alive && particle.energy >= CUTOFF && particle.collision_number < MAX_COLLISIONS {
        set.collide(&mut particle, &mut bank, &mut rng).unwrap();
    }
    particle
}

fn run_sequential(set: &ReactionSet, seed: u64, histories: u64) -> Vec<Particle> {
    (0..histories).map(|h| run_history(set, seed, h)).collect()
}

fn run_threaded(set: Arc<ReactionSet>, seed: u64, histories: u64, threads: u64) -> Vec<Particle> {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                (t..histories)
                    .step_by(threads as usize)
                    .map(|h| (h, run_history(&set, seed, h)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut results: Vec<(u64, Particle)> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    results.sort_by_key(|(h, _)| *h);
    results.into_iter().map(|(_, p)| p).collect()
}

#[test]
fn test_threaded_histories_match_sequential() {
    let set = Arc::new(reaction_set());
    let sequential = run_sequential(&set, 42, 200);
    for threads in [1, 3, 8] {
        let threaded = run_threaded(Arc::clone(&set), 42, 200, threads);
        assert_eq!(sequential, threaded, "{} threads", threads);
    }
}

#[test]
fn test_same_seed_same_histories() {
    let set = reaction_set();
    assert_eq!(run_sequential(&set, 7, 50), run_sequential(&set, 7, 50));
}

#[test]
fn test_different_seeds_differ() {
    let set = reaction_set();
    assert_ne!(run_sequential(&set, 7, 50), run_sequential(&set, 8, 50));
}

#[test]
fn test_histories_end_absorbed_or_slowed_down() {
    let set = reaction_set();
    for particle in run_sequential(&set, 3, 100) {
        assert!(particle.collision_number > 0);
        assert!(!particle.alive || particle.energy < CUTOFF || particle.collision_number == MAX_COLLISIONS);
        let norm: f64 = particle.direction.iter().map(|d| d * d).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }
}
