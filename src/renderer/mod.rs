//! Rendering module
//!
//! `frame` composes geometry and overlay from a read-only view;
//! `pipeline` uploads the geometry through WebGPU/WebGL.

pub mod frame;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use frame::{Frame, FrameView, Overlay, SummaryOverlay, compose};
pub use pipeline::RenderState;
pub use vertex::Vertex;
