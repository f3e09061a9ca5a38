pub mod chain;
pub mod config;
pub mod cycle;
pub mod market;
pub mod metrics;
pub mod planner;

pub mod error;
