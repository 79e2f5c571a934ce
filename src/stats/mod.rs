//! Statistics module - Summary statistics and density estimation

mod calculator;
mod density;

pub use calculator::StatsCalculator;
pub use density::{DensityEstimator, KDE_CUT};
