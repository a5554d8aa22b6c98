use ddt_core::{QueryMode, RngHandle};
use ddt_engine::{DesignSelector, DesignSpace, ParamSpace, PosteriorEngine};

fn small_spaces() -> (DesignSpace, ParamSpace) {
    let designs = DesignSpace::build(
        &[(0.0, 1.0), (0.0, 4.3), (0.0, 52.0)],
        &[(200.0, 800.0), (600.0, 800.0)],
    )
    .unwrap();
    let params = ParamSpace::build(vec![0.001, 0.01, 0.1], vec![0.5, 1.0, 2.0]).unwrap();
    (designs, params)
}

#[test]
fn random_mode_samples_the_grid_uniformly() {
    let (designs, params) = small_spaces();
    let n_designs = designs.len();
    let selector = DesignSelector::new(designs, &params);
    let engine = PosteriorEngine::new(params);
    let mut rng = RngHandle::from_seed(2024);

    let draws_per_cell = 1000;
    let total_draws = draws_per_cell * n_designs;
    let mut counts = vec![0usize; n_designs];
    for _ in 0..total_draws {
        let design = selector
            .choose(QueryMode::Random, &engine, &mut rng)
            .unwrap();
        let index = selector
            .designs()
            .iter()
            .position(|d| *d == design)
            .unwrap();
        counts[index] += 1;
    }

    // chi-square against the uniform expectation; df = 5, so a statistic
    // above 30 would reject uniformity far beyond the 0.001 level
    let expected = draws_per_cell as f64;
    let chi_square: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    assert!(
        chi_square < 30.0,
        "chi-square {chi_square} too large for uniform sampling: {counts:?}"
    );
    assert!(counts.iter().all(|&c| c > 0));
}

#[test]
fn random_mode_ignores_posterior_state() {
    let (designs, params) = small_spaces();
    let selector = DesignSelector::new(designs, &params);

    let flat_engine = PosteriorEngine::new(params.clone());
    let mut shifted_engine = PosteriorEngine::new(params);
    let probe = *selector.designs().get(0).unwrap();
    shifted_engine.update(&probe, 1).unwrap();

    let mut rng_a = RngHandle::from_seed(5);
    let mut rng_b = RngHandle::from_seed(5);
    for _ in 0..50 {
        let a = selector
            .choose(QueryMode::Random, &flat_engine, &mut rng_a)
            .unwrap();
        let b = selector
            .choose(QueryMode::Random, &shifted_engine, &mut rng_b)
            .unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn optimal_mode_on_standard_grid_returns_member() {
    let designs = DesignSpace::standard().unwrap();
    let params = ParamSpace::standard().unwrap();
    let selector = DesignSelector::new(designs, &params);
    let engine = PosteriorEngine::new(params);
    let mut rng = RngHandle::from_seed(0);

    let design = selector
        .choose(QueryMode::Optimal, &engine, &mut rng)
        .unwrap();
    assert!(selector.designs().iter().any(|d| *d == design));
    assert!(design.is_ordered());
}

#[test]
fn optimal_choice_shifts_with_the_posterior() {
    let (designs, params) = small_spaces();
    let selector = DesignSelector::new(designs, &params);
    let mut engine = PosteriorEngine::new(params);

    let flat_gains = selector.information_gain(engine.weights());
    for _ in 0..6 {
        let probe = *selector.designs().get(1).unwrap();
        engine.update(&probe, 1).unwrap();
    }
    let shifted_gains = selector.information_gain(engine.weights());
    assert_ne!(flat_gains, shifted_gains);
}
