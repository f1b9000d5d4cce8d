pub mod config;
pub mod fast;
pub mod milestones;
pub mod schedule;
pub mod stats;
pub mod water;
