//! Platform abstraction layer
//!
//! Host-independent pieces every embedding shares. Browser specifics live in
//! `crate::web`.

pub mod input;

pub use input::{HostAction, InputSource, dispatch};
