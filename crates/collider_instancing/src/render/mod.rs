//! Renderer-facing state
//!
//! Everything here is CPU-side bookkeeping; the renderer consumes it once per
//! frame through [`instancing::FrameData`].

pub mod instancing;
