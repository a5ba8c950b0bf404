//! Worker-side step execution for ironbot.

pub mod checkout;
pub mod runner;
pub mod shell;
pub mod worker;

pub use checkout::GitCheckout;
pub use runner::{OutputLine, OutputStream, RunnerConfig};
pub use shell::ShellRunner;
pub use worker::WorkerFiles;
