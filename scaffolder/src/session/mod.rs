//! Use cases over the agent loop: generate a new project or extend an existing one.
//!
//! Both seed the loop with their own prompts, time the run and fold the loop
//! outcome into a caller-facing result record. The action log is passed
//! through untouched.

mod extend;
mod generate;

pub use extend::{FeatureRequest, add_feature};
pub use generate::{GenerationRequest, generate_project};

use crate::looping::LoopStop;

/// A session result together with the reason its loop stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport<R> {
    pub result: R,
    pub stop: LoopStop,
}

impl<R> SessionReport<R> {
    pub fn is_complete(&self) -> bool {
        self.stop == LoopStop::Complete
    }
}
