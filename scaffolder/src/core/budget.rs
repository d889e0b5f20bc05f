//! Step budget for the agent loop.

/// Upper bound on model turns for one loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    max_steps: u32,
}

impl StepBudget {
    pub fn new(max_steps: u32) -> Self {
        Self { max_steps }
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Return the next step number, or `None` once the budget is spent.
    pub fn admit(&self, current: u32) -> Option<u32> {
        let next = current.checked_add(1)?;
        (next <= self.max_steps).then_some(next)
    }
}
