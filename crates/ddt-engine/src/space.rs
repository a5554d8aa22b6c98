//! Immutable design and parameter grids.
//!
//! Grids are constructed once per session and never mutated. Iteration order
//! is part of the contract: the selector's tie-break and replay determinism
//! both rely on it, so construction is fully deterministic and the flattening
//! rules below are fixed.

use ddt_core::errors::{DdtError, ErrorInfo};
use ddt_core::{make_linear_grid, make_log_grid, Design};
use sha2::{Digest, Sha256};

/// Later-larger delays (in weeks) used by the standard experiment.
pub const STANDARD_LATER_DELAYS: [f64; 18] = [
    0.43, 0.714, 1.0, 2.0, 3.0, 4.3, 6.44, 8.6, 10.8, 12.9, 17.2, 21.5, 26.0, 52.0, 104.0, 156.0,
    260.0, 520.0,
];

/// Reward of the later-larger option in the standard experiment.
pub const STANDARD_LATER_REWARD: f64 = 800.0;

/// The finite, ordered set of candidate designs.
///
/// Built as the filtered cross product of delay pairs and amount pairs:
/// delay pairs iterate in their listed order with amount pairs nested inside,
/// and any combination violating `t_ss < t_ll` or `r_ss < r_ll` is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    designs: Vec<Design>,
}

impl DesignSpace {
    /// Builds the grid from explicit delay and amount pairs.
    ///
    /// Fails with a configuration error when the ordering filter leaves the
    /// grid empty, which would make the experiment degenerate.
    pub fn build(
        delay_pairs: &[(f64, f64)],
        amount_pairs: &[(f64, f64)],
    ) -> Result<Self, DdtError> {
        let mut designs = Vec::new();
        for &(t_ss, t_ll) in delay_pairs {
            if t_ss >= t_ll {
                continue;
            }
            for &(r_ss, r_ll) in amount_pairs {
                if r_ss >= r_ll {
                    continue;
                }
                designs.push(Design {
                    t_ss,
                    t_ll,
                    r_ss,
                    r_ll,
                });
            }
        }
        if designs.is_empty() {
            return Err(DdtError::Configuration(
                ErrorInfo::new("design-grid-empty", "ordering filter left no valid designs")
                    .with_context("delay_pairs", delay_pairs.len().to_string())
                    .with_context("amount_pairs", amount_pairs.len().to_string()),
            ));
        }
        Ok(Self { designs })
    }

    /// Builds the standard delay-discounting grid.
    ///
    /// Sooner rewards run from 10 to 780 in steps of 10 against a fixed later
    /// reward of 800; the sooner option is always immediate against the
    /// standard later-delay table. 18 delay pairs by 78 amount pairs.
    pub fn standard() -> Result<Self, DdtError> {
        let delay_pairs: Vec<(f64, f64)> = STANDARD_LATER_DELAYS
            .iter()
            .map(|&t_ll| (0.0, t_ll))
            .collect();
        let amount_pairs: Vec<(f64, f64)> = (1..=78)
            .map(|i| (10.0 * i as f64, STANDARD_LATER_REWARD))
            .collect();
        Self::build(&delay_pairs, &amount_pairs)
    }

    /// Number of designs in the grid.
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    /// Returns true when the grid holds no designs.
    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }

    /// Returns the design at the given grid index.
    pub fn get(&self, index: usize) -> Option<&Design> {
        self.designs.get(index)
    }

    /// Iterates designs in grid order.
    pub fn iter(&self) -> std::slice::Iter<'_, Design> {
        self.designs.iter()
    }

    /// Immutable view over the full grid.
    pub fn designs(&self) -> &[Design] {
        &self.designs
    }

    /// Canonical digest over the grid members, stable across runs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for design in &self.designs {
            hasher.update(design.t_ss.to_bits().to_be_bytes());
            hasher.update(design.t_ll.to_bits().to_be_bytes());
            hasher.update(design.r_ss.to_bits().to_be_bytes());
            hasher.update(design.r_ll.to_bits().to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Joint grid over the latent parameters `k` (discount rate) and `tau`
/// (choice temperature), flattened k-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpace {
    k: Vec<f64>,
    tau: Vec<f64>,
}

impl ParamSpace {
    /// Builds the joint grid from explicit axes.
    ///
    /// Both axes must be non-empty and strictly increasing; the flattened
    /// ordering (`k` outer, `tau` inner) is fixed for the session lifetime.
    pub fn build(k: Vec<f64>, tau: Vec<f64>) -> Result<Self, DdtError> {
        for (name, axis) in [("k", &k), ("tau", &tau)] {
            if axis.is_empty() {
                return Err(DdtError::Configuration(
                    ErrorInfo::new("param-grid-empty", "parameter axis holds no values")
                        .with_context("axis", name),
                ));
            }
            if axis.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(DdtError::Configuration(
                    ErrorInfo::new(
                        "param-grid-order",
                        "parameter axis must be strictly increasing",
                    )
                    .with_context("axis", name),
                ));
            }
        }
        Ok(Self { k, tau })
    }

    /// Builds the standard parameter grid: 50 log-spaced discount rates in
    /// `(1e-4, 10)` against 50 linearly spaced temperatures in `(0, 5)`.
    pub fn standard() -> Result<Self, DdtError> {
        Self::build(
            make_log_grid(1e-4, 10.0, 50)?,
            make_linear_grid(0.0, 5.0, 50)?,
        )
    }

    /// Number of points in the flattened joint grid.
    pub fn num_points(&self) -> usize {
        self.k.len() * self.tau.len()
    }

    /// Returns `(k, tau)` at the given flattened index.
    pub fn point(&self, flat: usize) -> (f64, f64) {
        let n_tau = self.tau.len();
        (self.k[flat / n_tau], self.tau[flat % n_tau])
    }

    /// Discount-rate axis.
    pub fn k_values(&self) -> &[f64] {
        &self.k
    }

    /// Choice-temperature axis.
    pub fn tau_values(&self) -> &[f64] {
        &self.tau
    }

    /// Canonical digest over both axes, stable across runs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for value in self.k.iter().chain(self.tau.iter()) {
            hasher.update(value.to_bits().to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_design_grid_has_expected_shape() {
        let space = DesignSpace::standard().unwrap();
        assert_eq!(space.len(), 18 * 78);
        assert!(space.iter().all(Design::is_ordered));
        let first = space.get(0).unwrap();
        assert_eq!(first.t_ll, STANDARD_LATER_DELAYS[0]);
        assert_eq!(first.r_ss, 10.0);
    }

    #[test]
    fn ordering_filter_drops_inverted_pairs() {
        let space = DesignSpace::build(&[(0.0, 1.0), (2.0, 1.0)], &[(10.0, 20.0)]).unwrap();
        assert_eq!(space.len(), 1);
        assert!(DesignSpace::build(&[(2.0, 1.0)], &[(10.0, 20.0)]).is_err());
    }

    #[test]
    fn param_space_flattening_is_k_major() {
        let space = ParamSpace::build(vec![0.1, 0.2], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(space.num_points(), 6);
        assert_eq!(space.point(0), (0.1, 1.0));
        assert_eq!(space.point(2), (0.1, 3.0));
        assert_eq!(space.point(3), (0.2, 1.0));
    }

    #[test]
    fn param_space_rejects_unsorted_axes() {
        assert!(ParamSpace::build(vec![0.2, 0.1], vec![1.0]).is_err());
        assert!(ParamSpace::build(vec![], vec![1.0]).is_err());
    }

    #[test]
    fn digests_are_stable_and_sensitive() {
        let a = DesignSpace::standard().unwrap();
        let b = DesignSpace::standard().unwrap();
        assert_eq!(a.digest(), b.digest());

        let small = DesignSpace::build(&[(0.0, 1.0)], &[(10.0, 20.0)]).unwrap();
        assert_ne!(a.digest(), small.digest());
    }
}
