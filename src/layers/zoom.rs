//! Zoom layer: the tile grid for one zoom level
//!
//! A layer is created for every valid zoom level when the viewport is
//! built. Tiles are created lazily the first time they become visible and
//! are never dropped, so re-enabling a layer reuses everything it already
//! loaded. During a zoom transition a layer can be resized to pose as a
//! different zoom level, which lets coarse tiles fill in underneath the
//! layer that is still loading.

use super::types::{EnsureOutcome, FetchOutcome, TileHandle, TileState};
use crate::core::geo::{Size, TileKey};
use crate::core::scale::scale_dimension;
use crate::tiles::loader::FetchCollaborator;
use crate::tiles::source::TileSource;
use fxhash::FxHashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct ZoomLayer {
    level: i32,
    source: Arc<TileSource>,
    tiles: FxHashMap<(u32, u32), TileHandle>,
    enabled: bool,
    priority: i32,
    effective_zoom: i32,
}

impl ZoomLayer {
    pub fn new(source: Arc<TileSource>, level: i32) -> Self {
        Self {
            level,
            source,
            tiles: FxHashMap::default(),
            enabled: false,
            priority: 0,
            effective_zoom: level,
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Zoom level the tiles are currently laid out for
    pub fn effective_zoom(&self) -> i32 {
        self.effective_zoom
    }

    /// Show the layer with the given stacking priority.
    pub fn enable(&mut self, priority: i32) {
        self.enabled = true;
        self.priority = priority;
    }

    /// Hide the layer. Tiles are kept for later reuse.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Current on-screen tile size.
    pub fn tile_size(&self) -> Size {
        let dz = self.effective_zoom - self.level;
        Size::new(
            scale_dimension(self.source.tile_width(), dz),
            scale_dimension(self.source.tile_height(), dz),
        )
    }

    /// Make sure tile `(col, row)` exists, fetching it if it is new.
    ///
    /// Existing tiles are only refetched when the source forces refreshes;
    /// the handle itself is reused.
    pub fn ensure_tile<F>(&mut self, col: u32, row: u32, fetcher: &mut F) -> EnsureOutcome
    where
        F: FetchCollaborator + ?Sized,
    {
        self.ensure_tile_with_view(col, row, None, fetcher)
    }

    pub(crate) fn ensure_tile_with_view<F>(
        &mut self,
        col: u32,
        row: u32,
        view: Option<Size>,
        fetcher: &mut F,
    ) -> EnsureOutcome
    where
        F: FetchCollaborator + ?Sized,
    {
        let size = self.tile_size();
        let key = TileKey::new(self.level, col, row);

        let outcome = if !self.tiles.contains_key(&(col, row)) {
            self.tiles.insert((col, row), TileHandle::new(key, size.width, size.height));
            EnsureOutcome::Created
        } else if self.source.force_refresh() {
            EnsureOutcome::Refetched
        } else {
            return EnsureOutcome::Present;
        };

        let locator = self.source.build_tile_locator_with_view(col, row, self.level, view);
        if let Some(handle) = self.tiles.get_mut(&(col, row)) {
            handle.mark_requested();
        }
        log::debug!("{:?} {} -> {}", outcome, key, locator);
        fetcher.fetch(key, locator);

        outcome
    }

    /// Lay every tile out as if this layer were at `target_zoom`.
    ///
    /// With `target_zoom == level` this restores the native size.
    pub fn resize_for_effective_zoom(&mut self, target_zoom: i32) {
        self.effective_zoom = target_zoom;
        let size = self.tile_size();
        for handle in self.tiles.values_mut() {
            handle.layout(size.width, size.height);
        }
    }

    /// Apply a fetch completion. Returns `false` for tiles this layer never created.
    pub fn complete(&mut self, key: TileKey, outcome: FetchOutcome) -> bool {
        if key.zoom != self.level {
            return false;
        }
        let Some(handle) = self.tiles.get_mut(&(key.col, key.row)) else {
            log::warn!("completion for unknown {}", key);
            return false;
        };

        match outcome {
            FetchOutcome::Loaded(payload) => {
                log::debug!("{} loaded ({} bytes)", key, payload.len());
                handle.mark_loaded(payload);
            }
            FetchOutcome::Failed(error) => {
                log::warn!("{} failed: {}", key, error);
                handle.mark_error(error);
            }
        }
        true
    }

    pub fn tile(&self, col: u32, row: u32) -> Option<&TileHandle> {
        self.tiles.get(&(col, row))
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        self.tiles.contains_key(&(col, row))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileHandle> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.values().filter(|t| t.state == TileState::Loaded).count()
    }

    pub fn pending_count(&self) -> usize {
        self.len() - self.loaded_count()
    }
}
