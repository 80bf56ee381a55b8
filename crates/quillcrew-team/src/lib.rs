//! Engine boundary for quillcrew
//!
//! The multi-agent orchestration itself (agent turn-taking, model calls,
//! selector logic) lives in an external studio engine. This crate owns the
//! seam to it: the `TeamRunner` trait, an HTTP client implementation, the
//! canonical message model the engine's loosely-typed payloads are resolved
//! into at ingestion, and the serialization adapter that flattens a run
//! result into the wire types.

pub mod message;
pub mod runner;
pub mod serializer;

pub use message::{MessageBody, RunResult, TaskResult, TeamMessage, UsageRecord};
pub use runner::{team_file_from_env, StudioClient, TeamError, TeamRunner};
pub use serializer::{serialize_message, serialize_task_result};
