//! Run orchestration for ironbot.
//!
//! Holds the per-run step queue, the expander that injects package builds
//! into a live run, the tag-based trigger dispatcher, and the build
//! factories that assemble the static part of each builder's steps.

pub mod expander;
pub mod factories;
pub mod queue;
pub mod triggers;

pub use expander::PackageExpander;
pub use factories::{
    ArchIsoFactory, ArchPackagesFactory, BuildFactory, DockerHubFactory, FlatpakFactory,
};
pub use queue::StepQueue;
pub use triggers::{TagFilter, TriggerDispatcher};
