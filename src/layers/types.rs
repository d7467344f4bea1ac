//! Core data types for zoom layer tiles

use crate::core::geo::TileKey;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Requested, not yet displayable. Failed tiles stay here.
    Pending,
    Loaded,
}

/// Bytes returned by the fetch collaborator. Decoding is the renderer's job.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePayload {
    pub bytes: Arc<Vec<u8>>,
    pub content_type: Option<String>,
}

impl TilePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(TilePayload),
    Failed(String),
}

/// A finished fetch, addressed to the handle that requested it.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCompletion {
    pub key: TileKey,
    pub outcome: FetchOutcome,
}

impl TileCompletion {
    pub fn loaded(key: TileKey, payload: TilePayload) -> Self {
        Self {
            key,
            outcome: FetchOutcome::Loaded(payload),
        }
    }

    pub fn failed(key: TileKey, error: impl Into<String>) -> Self {
        Self {
            key,
            outcome: FetchOutcome::Failed(error.into()),
        }
    }
}

/// What `ensure_tile` did for a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    Refetched,
    Present,
}

impl EnsureOutcome {
    pub fn issued_fetch(&self) -> bool {
        !matches!(self, Self::Present)
    }
}

/// One tile of a zoom layer: where it sits and what it shows.
///
/// Geometry is in the layer's current effective zoom, relative to the
/// layer origin.
#[derive(Debug, Clone)]
pub struct TileHandle {
    pub key: TileKey,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub state: TileState,
    pub data: Option<TilePayload>,
    pub error: Option<String>,
    pub requests: u32,
}

impl TileHandle {
    pub fn new(key: TileKey, width: u32, height: u32) -> Self {
        let mut handle = Self {
            key,
            x: 0,
            y: 0,
            width,
            height,
            state: TileState::Pending,
            data: None,
            error: None,
            requests: 0,
        };
        handle.layout(width, height);
        handle
    }

    /// Place the tile on the grid for the given tile size.
    pub fn layout(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.x = self.key.col as i64 * width as i64;
        self.y = self.key.row as i64 * height as i64;
    }

    pub fn is_loaded(&self) -> bool {
        self.state == TileState::Loaded
    }

    pub fn mark_requested(&mut self) {
        self.requests += 1;
    }

    pub fn mark_loaded(&mut self, payload: TilePayload) {
        self.state = TileState::Loaded;
        self.data = Some(payload);
        self.error = None;
    }

    /// Records a failure. A tile that already shows content keeps it.
    pub fn mark_error(&mut self, error: String) {
        self.error = Some(error);
    }

    /// Top-left corner relative to a viewport scrolled to `(scroll_x, scroll_y)`.
    pub fn screen_position(&self, scroll_x: i64, scroll_y: i64) -> (i64, i64) {
        (self.x.saturating_sub(scroll_x), self.y.saturating_sub(scroll_y))
    }
}
