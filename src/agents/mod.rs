//! Agents module - the five-role execution unit.
//!
//! # Design
//! - One concrete [`AgentExecutor`] parameterized by [`AgentRole`]; role
//!   behavior is the prompt template and the static configuration, not a
//!   subclass hierarchy
//! - [`AgentRegistry`] builds the five configs once and is read-only after
//! - Per-agent failures degrade into an [`AgentResult`] with zero cost and
//!   confidence; the workflow never aborts because one call failed
//! - [`extract`] is the single JSON-or-prose parser shared by every step

pub mod config;
pub mod executor;
pub mod extract;
pub mod role;
mod types;

pub use config::{AgentConfig, AgentModels, AgentRegistry};
pub use executor::{estimate_confidence, extract_reasoning, AgentExecutor};
pub use extract::{extract, Extracted};
pub use role::AgentRole;
pub use types::AgentResult;
