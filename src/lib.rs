//! # tileview
//!
//! A tile viewport engine for very large raster images.
//!
//! The image is served as fixed-size tiles per zoom level. A [`Viewport`]
//! keeps one layer per level, works out which tiles the view needs, asks a
//! fetch collaborator for them, and cross-fades between levels when the
//! zoom changes so the view never goes blank while the new tiles load.
//! Drawing and fetching are left to the host through the
//! [`FetchCollaborator`] and [`RenderCollaborator`] traits.

pub mod core;
pub mod input;
pub mod layers;
pub mod rendering;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod tiles;
pub mod prelude;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ViewportOptions, ViewportProfile},
    deeplink::DeepLink,
    geo::{Size, TileKey, TileRange},
    scale::scale_by_zoom_delta,
    viewport::{ImageLink, TickReport, Viewport, ViewportState},
};

pub use layers::{FetchOutcome, TileCompletion, TileHandle, TilePayload, TileState, ZoomLayer};

pub use input::{EventHandled, ViewerEvent};

pub use rendering::{FrameRecorder, RenderCollaborator};

pub use tiles::{FetchCollaborator, QueuedFetcher, TileSource, TileSourceConfig};

#[cfg(feature = "tokio-runtime")]
pub use tiles::HttpTileLoader;

#[cfg(feature = "tokio-runtime")]
pub use runtime::{DriverHandle, ViewportDriver};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Invalid tile source: {0}")]
    InvalidSource(String),

    #[error("Zoom level {level} outside {min}..={max}")]
    InvalidZoomLevel { level: i32, min: i32, max: i32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = ViewerError;

/// Install `env_logger` as the `log` backend, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("tileview=info"))
        .format_timestamp_millis()
        .try_init();
}
