//! Side-effecting helpers: filesystem sandbox, processes, provider transport,
//! configuration, prompt rendering and summary persistence.

pub mod command;
pub mod config;
pub mod openai;
pub mod process;
pub mod prompt;
pub mod provider;
pub mod sandbox;
pub mod summary;
