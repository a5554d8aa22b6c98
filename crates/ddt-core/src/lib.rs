#![deny(missing_docs)]
#![doc = "Core types, error taxonomy, deterministic RNG and grid builders for the DDT adaptive experiment engine."]

pub mod errors;
pub mod grid;
pub mod rng;
mod types;

pub use errors::{DdtError, ErrorInfo};
pub use grid::{make_linear_grid, make_log_grid};
pub use rng::{derive_substream_seed, RngHandle};
pub use types::{resp_ss_from, BlockType, Design, QueryMode, SubjectId};
