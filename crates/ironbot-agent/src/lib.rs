//! Build worker for ironbot.

pub mod agent;
pub mod config;
pub mod executor;

pub use agent::BuildAgent;
pub use config::{BuilderConfig, BuilderKind, CiConfig};
pub use executor::RunExecutor;
