//! Hyperbolic delay-discounting choice model.
//!
//! A subject with discount rate `k` values a reward `r` delivered after delay
//! `t` at `r / (1 + k t)`. The probability of choosing the sooner-smaller
//! option follows a logistic rule over the discounted-value difference scaled
//! by the choice temperature `tau`.

use ddt_core::Design;

use crate::space::{DesignSpace, ParamSpace};

/// Present value of `reward` delivered after `delay` under discount rate `k`.
pub fn discounted_value(reward: f64, delay: f64, k: f64) -> f64 {
    reward / (1.0 + k * delay)
}

/// Probability of choosing the sooner-smaller option of `design` for a
/// subject at `(k, tau)`.
pub fn choice_prob_ss(design: &Design, k: f64, tau: f64) -> f64 {
    let v_ss = discounted_value(design.r_ss, design.t_ss, k);
    let v_ll = discounted_value(design.r_ll, design.t_ll, k);
    logistic(tau * (v_ss - v_ll))
}

/// Overflow-stable logistic function.
fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Sooner-smaller choice probabilities for the full `designs x parameters`
/// grid, evaluated once at construction.
///
/// The table is the batched evaluation behind design selection, which
/// touches every cell on every optimal-mode query; selection never falls
/// back to nested per-design scalar loops. Layout is design-major: row `d`
/// holds the probabilities for design `d` across the flattened parameter
/// grid.
#[derive(Debug, Clone)]
pub struct LikelihoodTable {
    prob_ss: Vec<f64>,
    n_params: usize,
}

impl LikelihoodTable {
    /// Evaluates the choice model over the full grid cross product.
    pub fn build(designs: &DesignSpace, params: &ParamSpace) -> Self {
        let n_params = params.num_points();
        let mut prob_ss = Vec::with_capacity(designs.len() * n_params);
        for design in designs.iter() {
            for flat in 0..n_params {
                let (k, tau) = params.point(flat);
                prob_ss.push(choice_prob_ss(design, k, tau));
            }
        }
        Self { prob_ss, n_params }
    }

    /// Number of flattened parameter points per row.
    pub fn n_params(&self) -> usize {
        self.n_params
    }

    /// Probability row for one design across all parameter points.
    pub fn row(&self, design_index: usize) -> &[f64] {
        let start = design_index * self.n_params;
        &self.prob_ss[start..start + self.n_params]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_design() -> Design {
        Design {
            t_ss: 0.0,
            t_ll: 4.3,
            r_ss: 500.0,
            r_ll: 800.0,
        }
    }

    #[test]
    fn higher_discount_rate_prefers_sooner() {
        let design = sample_design();
        let patient = choice_prob_ss(&design, 0.001, 1.0);
        let impatient = choice_prob_ss(&design, 0.5, 1.0);
        assert!(impatient > patient);
    }

    #[test]
    fn zero_temperature_is_indifferent() {
        let p = choice_prob_ss(&sample_design(), 0.05, 0.0);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn extreme_inputs_stay_finite() {
        let design = sample_design();
        let p_low = choice_prob_ss(&design, 1e-6, 100.0);
        let p_high = choice_prob_ss(&design, 100.0, 100.0);
        assert!((0.0..=1.0).contains(&p_low));
        assert!((0.0..=1.0).contains(&p_high));
    }

    #[test]
    fn table_rows_match_direct_evaluation() {
        let designs = DesignSpace::build(&[(0.0, 2.0)], &[(100.0, 200.0)]).unwrap();
        let params = ParamSpace::build(vec![0.01, 0.1], vec![0.5, 1.5]).unwrap();
        let table = LikelihoodTable::build(&designs, &params);
        let row = table.row(0);
        assert_eq!(row.len(), 4);
        let (k, tau) = params.point(3);
        assert_eq!(row[3], choice_prob_ss(designs.get(0).unwrap(), k, tau));
    }
}
