//! Notegraph Layout - force-directed placement of graph nodes
//!
//! The physics lives in a pure [`step`] function over an arena of bodies;
//! [`LayoutSimulator`] owns that arena across frames and adds run state,
//! warm starts, dragging and pinning.

pub mod config;
pub mod simulator;
pub mod step;
pub mod vector;

pub use config::LayoutConfig;
pub use simulator::{LayoutLink, LayoutNode, LayoutSimulator, RunState, WarmStart};
pub use step::{Body, FRAME_SECONDS, LayoutState, PinState, Spring, step};
pub use vector::Vec2;
