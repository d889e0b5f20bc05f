//! Stable exit codes for scaffolder CLI commands.

/// Session complete, command succeeded, or the operator declined to proceed.
pub const OK: i32 = 0;
/// Invalid input, configuration or other runtime error.
pub const INVALID: i32 = 1;
/// The step budget ran out before the model declared completion.
pub const BUDGET_EXHAUSTED: i32 = 2;
/// A provider call failed mid-session.
pub const PROVIDER_FAILED: i32 = 3;
