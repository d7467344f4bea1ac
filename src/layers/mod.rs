//! Zoom layers and the tiles they hold

pub mod types;
pub mod zoom;

pub use types::{EnsureOutcome, FetchOutcome, TileCompletion, TileHandle, TilePayload, TileState};
pub use zoom::ZoomLayer;
