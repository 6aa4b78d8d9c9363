//! Frameloom Jobs
//!
//! Tracks render jobs from submission to their terminal state and defines
//! the request/response shapes a server would expose for them. Jobs live
//! in memory only; whatever fronts this crate owns transport and
//! persistence concerns.

pub mod api;
pub mod manager;
pub mod runner;

pub use api::*;
pub use manager::*;
pub use runner::*;
