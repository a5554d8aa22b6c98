//! Grid posterior over the latent parameters.

use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::Design;
use serde::{Deserialize, Serialize};

use crate::model;
use crate::space::ParamSpace;

/// Tolerance used when asserting that the weights stay normalized.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// Per-parameter point estimate (marginal mean or standard deviation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamEstimate {
    /// Discount-rate component.
    pub k: f64,
    /// Choice-temperature component.
    pub tau: f64,
}

/// Bayesian weight array over the flattened parameter grid.
///
/// Weights start uniform, are multiplied by the response likelihood on every
/// completed trial and renormalized to sum to one. Updates happen in the
/// strict per-session trial order; the same sequence of updates always yields
/// the same weights, which is what snapshot replay relies on.
#[derive(Debug, Clone)]
pub struct PosteriorEngine {
    params: ParamSpace,
    weights: Vec<f64>,
}

impl PosteriorEngine {
    /// Creates an engine with uniform weights over the given grid.
    pub fn new(params: ParamSpace) -> Self {
        let n = params.num_points();
        Self {
            params,
            weights: vec![1.0 / n as f64; n],
        }
    }

    /// The parameter grid the weights are indexed by.
    pub fn params(&self) -> &ParamSpace {
        &self.params
    }

    /// Current joint weights in flattened grid order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Applies one Bayes step for an observed `(design, response)` pair.
    ///
    /// `resp_ss` is 1 when the sooner-smaller option was chosen. If the
    /// response carries zero likelihood mass across the whole grid the update
    /// is rejected as a configuration error: the grid cannot explain the
    /// observation, and renormalizing to uniform would silently discard every
    /// previous trial.
    pub fn update(&mut self, design: &Design, resp_ss: u8) -> Result<(), DdtError> {
        if resp_ss > 1 {
            return Err(DdtError::InvalidState(
                ErrorInfo::new("response-alphabet", "response must be 0 or 1")
                    .with_context("resp_ss", resp_ss.to_string()),
            ));
        }
        let mut total = 0.0;
        for (flat, weight) in self.weights.iter_mut().enumerate() {
            let (k, tau) = self.params.point(flat);
            let p_ss = model::choice_prob_ss(design, k, tau);
            let likelihood = if resp_ss == 1 { p_ss } else { 1.0 - p_ss };
            *weight *= likelihood;
            total += *weight;
        }
        if !(total.is_finite() && total > 0.0) {
            return Err(DdtError::Configuration(
                ErrorInfo::new(
                    "posterior-degenerate",
                    "response carries no likelihood mass on the parameter grid",
                )
                .with_context("total_mass", total.to_string())
                .with_context("resp_ss", resp_ss.to_string()),
            ));
        }
        for weight in &mut self.weights {
            *weight /= total;
        }
        Ok(())
    }

    /// Marginal posterior mean of each parameter.
    pub fn posterior_mean(&self) -> ParamEstimate {
        let (mean, _) = self.moments();
        mean
    }

    /// Marginal posterior standard deviation of each parameter.
    pub fn posterior_sd(&self) -> ParamEstimate {
        let (_, sd) = self.moments();
        sd
    }

    /// Reinitializes the weights to uniform.
    ///
    /// Called when a scored block begins so that training-block responses
    /// leave no trace in the posterior.
    pub fn reset(&mut self) {
        let n = self.weights.len();
        self.weights.fill(1.0 / n as f64);
    }

    fn moments(&self) -> (ParamEstimate, ParamEstimate) {
        let n_tau = self.params.tau_values().len();
        let mut mean_k = 0.0;
        let mut mean_tau = 0.0;
        let mut sq_k = 0.0;
        let mut sq_tau = 0.0;
        for (flat, &weight) in self.weights.iter().enumerate() {
            let k = self.params.k_values()[flat / n_tau];
            let tau = self.params.tau_values()[flat % n_tau];
            mean_k += weight * k;
            mean_tau += weight * tau;
            sq_k += weight * k * k;
            sq_tau += weight * tau * tau;
        }
        let mean = ParamEstimate {
            k: mean_k,
            tau: mean_tau,
        };
        let sd = ParamEstimate {
            k: (sq_k - mean_k * mean_k).max(0.0).sqrt(),
            tau: (sq_tau - mean_tau * mean_tau).max(0.0).sqrt(),
        };
        (mean, sd)
    }
}
