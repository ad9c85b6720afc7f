//! # SarComp Parallel
//!
//! Execution strategies for per-location raster computations.
//!
//! Every location of a composite is independent, so work is partitioned by
//! rows and spread over a Rayon pool. Long runs can be stopped through a
//! shared [`CancelToken`], checked once per location.

pub mod cancel;
pub mod strategy;

pub use cancel::CancelToken;
pub use strategy::{num_cpus, ProcessingMode};
