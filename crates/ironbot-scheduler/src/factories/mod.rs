//! Build factories.
//!
//! A factory assembles the steps one builder runs for every change. The
//! list is fixed when the run starts, except for what `ExpandPackages`
//! injects later.

mod arch;
mod docker_hub;
mod flatpak;

pub use arch::{ArchIsoFactory, ArchPackagesFactory};
pub use docker_hub::DockerHubFactory;
pub use flatpak::FlatpakFactory;

use ironbot_core::pipeline::{CheckoutStep, Step};
use ironbot_core::run::BuildProperties;

/// Produces the initial steps of a builder.
pub trait BuildFactory: Send + Sync {
    /// Builder kind, used in logs.
    fn kind(&self) -> &'static str;

    /// Steps for a run of the change described by `props`.
    fn steps(&self, props: &BuildProperties) -> Vec<Step>;
}

/// Incremental, shallow checkout with submodules of the triggering change.
fn checkout_sources(props: &BuildProperties) -> Step {
    let mut checkout = CheckoutStep::sources(&props.repository, &props.branch);
    checkout.codebase = props.codebase.clone();
    Step::Checkout(checkout)
}
