//! Per-run work queue.
//!
//! Every run owns one queue. The executor pops steps off the front one at a
//! time; a running step may splice new steps in directly behind itself.

use ironbot_core::pipeline::Step;
use ironbot_core::{Error, Result};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueState {
    Open,
    Terminated,
}

/// Ordered steps still to run, plus the step currently running.
#[derive(Debug)]
pub struct StepQueue {
    pending: VecDeque<Step>,
    current: Option<String>,
    state: QueueState,
}

impl StepQueue {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            pending: steps.into_iter().collect(),
            current: None,
            state: QueueState::Open,
        }
    }

    /// Take the next step and mark it as current.
    pub fn start_next(&mut self) -> Option<Step> {
        if self.state == QueueState::Terminated {
            return None;
        }
        let step = self.pending.pop_front()?;
        self.current = Some(step.name().to_string());
        Some(step)
    }

    /// Mark the current step as finished.
    pub fn finish_current(&mut self) {
        self.current = None;
    }

    /// Name of the running step, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Insert `steps` right behind the running step, ahead of everything
    /// that was already queued. The relative order of `steps` is kept.
    pub fn insert_after_current(&mut self, steps: Vec<Step>) -> Result<usize> {
        if self.state == QueueState::Terminated {
            return Err(Error::InjectionRejected("run already terminated".to_string()));
        }
        if self.current.is_none() {
            return Err(Error::InjectionRejected("no step is running".to_string()));
        }

        let count = steps.len();
        for step in steps.into_iter().rev() {
            self.pending.push_front(step);
        }
        Ok(count)
    }

    /// Stop the queue. Returns the steps that will never run.
    pub fn terminate(&mut self) -> Vec<Step> {
        self.state = QueueState::Terminated;
        self.current = None;
        self.pending.drain(..).collect()
    }

    pub fn is_terminated(&self) -> bool {
        self.state == QueueState::Terminated
    }

    pub fn pending(&self) -> impl Iterator<Item = &Step> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
