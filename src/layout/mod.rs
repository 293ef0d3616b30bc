//! Generic force-directed layout.

mod config;
mod simulation;

pub use config::LayoutConfig;
pub use simulation::{Body, Simulation};
