//! Notegraph View - interaction layer over the graph and its layout
//!
//! Filters, neighborhood focus, hover highlighting, selection, debounced
//! recomputation and render snapshots. Everything here is single-threaded
//! and driven by [`InteractionController::on_frame`].

pub mod config;
pub mod controller;
pub mod debounce;
pub mod filter;
pub mod focus;
pub mod frame;
pub mod hover;


pub use config::{DEFAULT_CONFIG_FILE, EngineConfig, ViewConfig};
pub use controller::{InteractionController, SelectHandler};
pub use debounce::Debouncer;
pub use filter::{FilterState, VisibleSet, visible_subgraph};
pub use focus::{Focus, neighborhood};
pub use frame::{RenderFrame, RenderLink, RenderNode};
pub use hover::HoverOverlay;
