//! LLM tool-calling agent that scaffolds and extends software projects.
//!
//! A chat model is given a fixed catalog of file and shell tools confined to
//! one project directory and is driven in a bounded loop until it declares the
//! work finished. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (transcript types, tool catalog, completion
//!   detection, command policy, write classification). No I/O.
//! - **[`io`]**: Side effects (sandboxed filesystem, processes, the provider
//!   transport, configuration, prompts, summary persistence).
//!
//! Orchestration modules ([`dispatch`], [`step`], [`looping`], [`session`])
//! combine the two to implement the CLI commands.

pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod session;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
