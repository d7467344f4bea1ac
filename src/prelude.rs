//! Prelude module for common tileview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tileview::prelude::*;`

pub use crate::core::{
    config::{ViewportOptions, ViewportProfile},
    constants::{ACTIVE_LAYER_PRIORITY, FADING_LAYER_PRIORITY, TILE_SIZE},
    debounce::DebounceScheduler,
    deeplink::DeepLink,
    geo::{Size, TileKey, TileRange},
    scale::scale_by_zoom_delta,
    viewport::{ImageLink, TickReport, Viewport, ViewportState},
};

pub use crate::layers::{EnsureOutcome, FetchOutcome, TileCompletion, TileHandle, TilePayload, TileState, ZoomLayer};

pub use crate::input::{EventHandled, ViewerEvent};

pub use crate::rendering::{DrawnTile, FrameRecorder, RenderCollaborator};

pub use crate::tiles::{FetchCollaborator, QueuedFetcher, TileSource, TileSourceBuilder, ZoomParam};

#[cfg(feature = "tokio-runtime")]
pub use crate::tiles::HttpTileLoader;

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::{DriverHandle, ViewportDriver};

pub use crate::{Error as ViewerError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
