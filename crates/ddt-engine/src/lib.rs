#![deny(missing_docs)]

//! Grid-Bayesian engine for the adaptive delay-discounting experiment:
//! design/parameter spaces, the hyperbolic choice model, the posterior
//! weight array and information-maximizing design selection.

/// Hyperbolic choice model and the batched likelihood table.
pub mod model;
/// Posterior weight array over the parameter grid.
pub mod posterior;
/// Design selection by expected information gain.
pub mod selector;
/// Immutable design and parameter grids.
pub mod space;

pub use model::{choice_prob_ss, discounted_value, LikelihoodTable};
pub use posterior::{ParamEstimate, PosteriorEngine, NORMALIZATION_TOLERANCE};
pub use selector::DesignSelector;
pub use space::{DesignSpace, ParamSpace, STANDARD_LATER_DELAYS, STANDARD_LATER_REWARD};
