use ddt_engine::{DesignSpace, ParamSpace, PosteriorEngine, NORMALIZATION_TOLERANCE};
use proptest::prelude::*;

fn small_spaces() -> (DesignSpace, ParamSpace) {
    let designs = DesignSpace::build(
        &[(0.0, 1.0), (0.0, 4.3), (0.0, 26.0), (0.0, 104.0)],
        &[(100.0, 800.0), (300.0, 800.0), (500.0, 800.0), (700.0, 800.0)],
    )
    .unwrap();
    let params = ParamSpace::build(
        vec![0.0005, 0.002, 0.01, 0.05, 0.2, 1.0],
        vec![0.25, 0.5, 1.0, 2.0, 4.0],
    )
    .unwrap();
    (designs, params)
}

proptest! {
    #[test]
    fn weights_stay_normalized_for_any_valid_sequence(
        steps in prop::collection::vec((0usize..16, 0u8..2), 1..40)
    ) {
        let (designs, params) = small_spaces();
        let mut engine = PosteriorEngine::new(params);
        for (design_index, resp_ss) in steps {
            let design = *designs.get(design_index).unwrap();
            engine.update(&design, resp_ss).unwrap();
            let total: f64 = engine.weights().iter().sum();
            prop_assert!((total - 1.0).abs() < NORMALIZATION_TOLERANCE);
            prop_assert!(engine.weights().iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn identical_sequences_yield_identical_weights(
        steps in prop::collection::vec((0usize..16, 0u8..2), 1..20)
    ) {
        let (designs, params) = small_spaces();
        let mut engine_a = PosteriorEngine::new(params.clone());
        let mut engine_b = PosteriorEngine::new(params);
        for (design_index, resp_ss) in steps {
            let design = *designs.get(design_index).unwrap();
            engine_a.update(&design, resp_ss).unwrap();
            engine_b.update(&design, resp_ss).unwrap();
        }
        prop_assert_eq!(engine_a.weights(), engine_b.weights());
    }
}

#[test]
fn standard_spaces_support_long_update_runs() {
    let designs = DesignSpace::standard().unwrap();
    let params = ParamSpace::standard().unwrap();
    let mut engine = PosteriorEngine::new(params);
    for trial in 0..60 {
        let design = *designs.get((trial * 37) % designs.len()).unwrap();
        engine.update(&design, (trial % 2) as u8).unwrap();
        let total: f64 = engine.weights().iter().sum();
        assert!((total - 1.0).abs() < NORMALIZATION_TOLERANCE);
    }
    let sd = engine.posterior_sd();
    assert!(sd.k.is_finite() && sd.tau.is_finite());
}
