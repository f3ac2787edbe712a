//! Grouped cluster-dynamics core for radiation damage evolution.
//!
//! Vacancy and interstitial cluster populations are tracked on two size
//! axes. Small mobile sizes keep one unknown each; larger sizes are binned
//! into groups carrying a two-moment (L0 average, L1 slope) profile. The
//! crate builds the group boundaries, aggregates per-size reaction rates
//! into group constants, and evaluates the residual and diagonal Jacobian
//! contributions of the resulting reaction network for an external
//! nonlinear solver.

pub mod cluster;
pub mod config;
pub mod error;
pub mod grouping;
pub mod kinetics;
pub mod network;
