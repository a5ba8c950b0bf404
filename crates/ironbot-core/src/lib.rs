//! ironbot core
//!
//! Domain types, traits, and error handling shared by every ironbot crate:
//! the build manifest, the step model a run executes, the trigger catalog,
//! and the ports the executor plugs adapters into.

pub mod error;
pub mod ids;
pub mod manifest;
pub mod pipeline;
pub mod ports;
pub mod run;
pub mod trigger;

pub use error::{Error, Result};
pub use ids::*;
pub use manifest::Manifest;
pub use pipeline::{CheckoutStep, ExecutionStep, ExpandStep, Step};
pub use trigger::{EndpointTemplate, NotificationRequest, TriggerTarget};
