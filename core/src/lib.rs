//! Synthetic insurance-portfolio analytics.
//!
//! A single-pass batch pipeline: generate a synthetic set of policies
//! and correlated claims, load both into SQLite, run the fixed
//! aggregate reports, export each result as CSV, and render one chart
//! per report.
//!
//! Every stage is a function of explicit inputs (configuration, seed,
//! store handle). Nothing in this crate keeps global state.

pub mod analytics;
pub mod chart;
pub mod config;
pub mod error;
pub mod generator;
pub mod report;
pub mod rng;
pub mod store;
pub mod types;
