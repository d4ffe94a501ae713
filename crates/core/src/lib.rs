//! Domain model and policies for the mathviz pipeline.
//!
//! Holds the job record and its status machine, the in-memory job store,
//! and the generated-code extraction/validation policies. Everything here
//! is runtime-agnostic domain logic; process spawning and HTTP live in the
//! `mathviz-pipeline` and `mathviz-api` crates.

pub mod extract;
pub mod job;
pub mod store;

pub use job::{Job, JobStatus};
pub use store::JobStore;
