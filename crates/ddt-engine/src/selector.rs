//! Information-maximizing design selection.

use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::{Design, QueryMode, RngHandle};

use crate::model::LikelihoodTable;
use crate::posterior::PosteriorEngine;
use crate::space::{DesignSpace, ParamSpace};

/// Scores candidate designs against the current posterior and picks one.
///
/// The likelihood table over the full `designs x parameters` grid is built
/// once at construction; each optimal-mode query is then a single batched
/// pass over the table rather than nested per-trial model evaluations.
#[derive(Debug, Clone)]
pub struct DesignSelector {
    designs: DesignSpace,
    table: LikelihoodTable,
}

impl DesignSelector {
    /// Builds the selector and its likelihood table over the given spaces.
    pub fn new(designs: DesignSpace, params: &ParamSpace) -> Self {
        let table = LikelihoodTable::build(&designs, params);
        Self { designs, table }
    }

    /// The design grid this selector draws from.
    pub fn designs(&self) -> &DesignSpace {
        &self.designs
    }

    /// Picks the next design for the requested mode.
    ///
    /// `Optimal` maximizes expected information gain under the engine's
    /// current weights; `Random` and `Train` draw uniformly from the grid
    /// and neither read nor consume posterior state.
    pub fn choose(
        &self,
        mode: QueryMode,
        engine: &PosteriorEngine,
        rng: &mut RngHandle,
    ) -> Result<Design, DdtError> {
        let index = match mode {
            QueryMode::Optimal => self.choose_optimal(engine.weights())?,
            QueryMode::Random | QueryMode::Train => self.choose_random(rng)?,
        };
        Ok(self.designs.designs()[index])
    }

    /// Expected information gain of every design under the given weights.
    ///
    /// For each design the predictive response distribution is the
    /// posterior-weighted marginal of the choice probabilities; the gain is
    /// the mutual information between the hypothetical response and the
    /// parameter, i.e. marginal response entropy minus the posterior-weighted
    /// mean of the per-parameter response entropies.
    pub fn information_gain(&self, weights: &[f64]) -> Vec<f64> {
        let mut gains = Vec::with_capacity(self.designs.len());
        for index in 0..self.designs.len() {
            let row = self.table.row(index);
            let mut marginal = 0.0;
            let mut conditional_entropy = 0.0;
            for (&weight, &p_ss) in weights.iter().zip(row.iter()) {
                marginal += weight * p_ss;
                conditional_entropy += weight * binary_entropy(p_ss);
            }
            gains.push(binary_entropy(marginal) - conditional_entropy);
        }
        gains
    }

    fn choose_optimal(&self, weights: &[f64]) -> Result<usize, DdtError> {
        if self.designs.is_empty() {
            return Err(empty_grid_error());
        }
        let gains = self.information_gain(weights);
        let mut best = 0;
        let mut best_gain = gains[0];
        // strict comparison keeps the earliest maximum: ties break to the
        // first design in grid iteration order
        for (index, &gain) in gains.iter().enumerate().skip(1) {
            if gain > best_gain {
                best = index;
                best_gain = gain;
            }
        }
        Ok(best)
    }

    fn choose_random(&self, rng: &mut RngHandle) -> Result<usize, DdtError> {
        if self.designs.is_empty() {
            return Err(empty_grid_error());
        }
        Ok(rng.uniform_index(self.designs.len()))
    }
}

fn empty_grid_error() -> DdtError {
    DdtError::Configuration(ErrorInfo::new(
        "design-grid-empty",
        "cannot select from an empty design grid",
    ))
}

/// Entropy (nats) of a Bernoulli distribution with success probability `p`.
fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    let q = 1.0 - p;
    -(p * p.ln() + q * q.ln())
}
