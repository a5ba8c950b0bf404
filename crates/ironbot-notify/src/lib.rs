//! Rebuild trigger delivery for ironbot.
//!
//! Posts the notification requests produced by the trigger dispatcher to
//! the registry's build trigger endpoint.

pub mod sender;

pub use sender::{HttpTriggerSender, NotifyError};
