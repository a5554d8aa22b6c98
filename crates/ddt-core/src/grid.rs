//! Deterministic one-dimensional grid builders.
//!
//! Both builders return values strictly inside the open interval requested,
//! excluding the endpoints, so that degenerate boundary designs (zero delay
//! difference, zero choice temperature) never enter a grid. Identical inputs
//! always yield identically ordered output; design-selection tie-breaking
//! depends on this.

use crate::errors::{DdtError, ErrorInfo};

/// Returns `n` evenly spaced values strictly inside `(start, end)`.
///
/// Value `i` (1-based) is `start + i * (end - start) / (n + 1)`, so both
/// endpoints are excluded and the sequence is strictly increasing.
pub fn make_linear_grid(start: f64, end: f64, n: usize) -> Result<Vec<f64>, DdtError> {
    if n == 0 {
        return Err(DdtError::Configuration(ErrorInfo::new(
            "grid-empty",
            "requested a grid with zero points",
        )));
    }
    if !start.is_finite() || !end.is_finite() || end <= start {
        return Err(DdtError::Configuration(
            ErrorInfo::new("grid-bounds", "grid bounds must be finite with start < end")
                .with_context("start", start.to_string())
                .with_context("end", end.to_string()),
        ));
    }
    let step = (end - start) / (n as f64 + 1.0);
    Ok((1..=n).map(|i| start + step * i as f64).collect())
}

/// Returns `n` log-spaced values strictly inside `(a, b)`; requires `0 < a < b`.
///
/// The construction is [`make_linear_grid`] over `log10`, mapped back through
/// `10^x`, so spacing is uniform in log space.
pub fn make_log_grid(a: f64, b: f64, n: usize) -> Result<Vec<f64>, DdtError> {
    if a <= 0.0 {
        return Err(DdtError::Configuration(
            ErrorInfo::new("grid-log-domain", "log grid requires a positive lower bound")
                .with_context("a", a.to_string()),
        ));
    }
    let exponents = make_linear_grid(a.log10(), b.log10(), n)?;
    Ok(exponents.into_iter().map(|e| 10f64.powf(e)).collect())
}
