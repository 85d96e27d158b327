//! Salary prediction: deterministic post-processing around the three opaque
//! quantile predictors.

pub mod features;
pub mod handlers;
pub mod pipeline;
pub mod premiums;
pub mod tiers;
pub mod types;
