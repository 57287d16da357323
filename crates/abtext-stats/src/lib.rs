//! abtext-stats - Statistical functions for approval-rate experiments
//!
//! This crate provides the statistical primitives the experiment report
//! is built from:
//!
//! - **Summary**: mean, median, standard deviation, five-number summaries
//! - **Histogram**: equal-width binning for distribution charts
//! - **Proportion tests**: chi-square (Yates) and two-proportion z-tests,
//!   Wald confidence intervals on the rate difference
//! - **Sample size**: per-group size needed to detect a rate change
//!
//! Distribution functions come from `statrs`; everything else is plain
//! arithmetic over slices and counts.

pub mod error;
pub mod histogram;
pub mod normal;
pub mod proportion;
pub mod sample_size;
pub mod summary;

pub use error::*;
pub use histogram::*;
pub use proportion::*;
pub use sample_size::*;
pub use summary::*;
