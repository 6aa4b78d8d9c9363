//! Frameloom Export Pipeline
//!
//! Drives a composition from first captured frame to finished video
//! artifact: frames are pulled in ascending order from a render surface
//! (reusing the frame cache where possible), streamed into a pluggable
//! sink, and reported through a progress callback. Cancellation is
//! honored at every frame boundary.
//!
//! # Pipeline Architecture
//!
//! ```text
//! frame cache ──┐
//!               ├── obtain frame 0..n (ascending)
//! surface ──────┘         │
//!                         ├── ExportSink::push_frame
//! cancel signal ──────────┤         │
//!   (checked per frame)   │         ▼
//!                         │   ExportSink::finish
//!                         ▼         │
//!                  ExportProgress   ▼
//!                    callback   ExportArtifact
//! ```

pub mod cancel;
pub mod command;
pub mod orchestrator;
pub mod sink;

pub use cancel::*;
pub use command::*;
pub use orchestrator::*;
pub use sink::*;
