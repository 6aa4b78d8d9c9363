//! Frameloom Capture
//!
//! The boundary between a live render surface and the export pipeline:
//! - `RenderSurface`: the trait a rendering engine implements to hand
//!   frames over, plus a deterministic synthetic implementation
//! - `FrameBuffer`: owned RGBA8 pixel buffers
//! - PNG/JPEG/data-URI conversions for single frames
//! - `StreamingRecorder`: a state-guarded live recording session over a
//!   pluggable container sink
//! - `FrameSequence`: side-effect-free frame accumulation for
//!   animated-image assembly

pub mod convert;
pub mod frame;
pub mod recorder;
pub mod sequence;
pub mod surface;

pub use convert::*;
pub use frame::*;
pub use recorder::*;
pub use sequence::*;
pub use surface::*;
