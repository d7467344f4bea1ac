//! Viewport controller
//!
//! Owns one [`ZoomLayer`] per zoom level of the source, the scroll position
//! of the view and the two timers that drive it: the settle timer, which
//! hides the previous layer some time after a zoom change, and the refresh
//! debounce, which coalesces bursts of scroll events into one tile refresh.
//!
//! Time never advances on its own. The owner passes the current [`Instant`]
//! to [`Viewport::tick`], which fires whatever deadlines have passed and
//! applies finished fetches.

use crate::core::config::ViewportOptions;
use crate::core::constants::{ACTIVE_LAYER_PRIORITY, FADING_LAYER_PRIORITY};
use crate::core::debounce::{DebounceScheduler, Timer};
use crate::core::deeplink::DeepLink;
use crate::core::geo::{Size, TileKey, TileRange};
use crate::core::scale::{scale_by_zoom_delta, scale_dimension};
use crate::layers::types::FetchOutcome;
use crate::layers::zoom::ZoomLayer;
use crate::rendering::RenderCollaborator;
use crate::tiles::loader::FetchCollaborator;
use crate::tiles::source::TileSource;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of the view, in pixels of the active zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scroll_x: i64,
    pub scroll_y: i64,
    pub view_width: u32,
    pub view_height: u32,
    pub active_zoom_level: i32,
    pub transitioning_from_zoom_level: Option<i32>,
}

/// What a call to [`Viewport::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The debounced refresh ran
    pub refreshed: bool,
    /// Fetches issued by that refresh
    pub fetches_issued: usize,
    /// Level whose transition settled and was hidden
    pub settled: Option<i32>,
    /// Fetch completions applied to tiles
    pub tiles_completed: usize,
}

/// Locator and caption for a static export of the current view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLink {
    pub locator: String,
    pub label: String,
}

pub struct Viewport<F: FetchCollaborator> {
    source: Arc<TileSource>,
    options: ViewportOptions,
    fetcher: F,
    /// One layer per level, indexed by `level - zoom_min`
    layers: Vec<ZoomLayer>,
    active: i32,
    transitioning_from: Option<i32>,
    scroll_x: i64,
    scroll_y: i64,
    view: Size,
    center_offset_x: i64,
    center_offset_y: i64,
    /// Hides the carried level once it fires
    settle: Timer<i32>,
    refresh: DebounceScheduler,
    now: Instant,
    refresh_passes: u64,
}

impl<F: FetchCollaborator> Viewport<F> {
    /// Build a viewport centered on `options.initial_center` (or the image
    /// center) at `options.initial_zoom`, and request the visible tiles.
    pub fn new(source: Arc<TileSource>, options: ViewportOptions, fetcher: F) -> Result<Self> {
        Self::build(source, options, fetcher, DeepLink::default())
    }

    /// Like [`new`](Self::new), with the position taken from an `x:y:z`
    /// fragment where it can be read.
    pub fn from_fragment(
        source: Arc<TileSource>,
        options: ViewportOptions,
        fetcher: F,
        fragment: &str,
    ) -> Result<Self> {
        Self::build(source, options, fetcher, DeepLink::parse(fragment))
    }

    fn build(source: Arc<TileSource>, options: ViewportOptions, fetcher: F, link: DeepLink) -> Result<Self> {
        options.validate()?;
        if !source.is_valid_zoom(options.initial_zoom) {
            return Err(Error::InvalidZoomLevel {
                level: options.initial_zoom,
                min: source.zoom_min(),
                max: source.zoom_max(),
            });
        }

        let reference = options.reference_zoom;
        let (default_x, default_y) = options.initial_center.unwrap_or_else(|| {
            let image = source.image_size();
            (
                scale_by_zoom_delta(image.width as i64 / 2, reference),
                scale_by_zoom_delta(image.height as i64 / 2, reference),
            )
        });
        // fragments come from outside; keep their coordinates on the image
        let bounds = source.level_size(reference);
        let link = DeepLink {
            x: link.x.map(|x| x.clamp(0, bounds.width as i64)),
            y: link.y.map(|y| y.clamp(0, bounds.height as i64)),
            zoom: link.zoom,
        };
        let (center_x, center_y, mut zoom) = link.resolve(default_x, default_y, options.initial_zoom);
        if !source.is_valid_zoom(zoom) {
            log::debug!("deep link zoom {} out of range, using {}", zoom, options.initial_zoom);
            zoom = options.initial_zoom;
        }

        let layers = source
            .zoom_levels()
            .map(|level| ZoomLayer::new(Arc::clone(&source), level))
            .collect();

        let mut viewport = Self {
            view: options.view_size(),
            source,
            options,
            fetcher,
            layers,
            active: zoom,
            transitioning_from: None,
            scroll_x: 0,
            scroll_y: 0,
            center_offset_x: 0,
            center_offset_y: 0,
            settle: Timer::new(),
            refresh: DebounceScheduler::new(),
            now: Instant::now(),
            refresh_passes: 0,
        };

        viewport.active_layer_mut().enable(ACTIVE_LAYER_PRIORITY);
        viewport.update_center_offsets();
        viewport.scroll_center_to(
            scale_by_zoom_delta(center_x, zoom - reference),
            scale_by_zoom_delta(center_y, zoom - reference),
        );
        log::debug!(
            "viewport {}x{} at z{} centered on ({}, {})",
            viewport.view.width,
            viewport.view.height,
            zoom,
            center_x,
            center_y
        );
        viewport.refresh_visible_tiles();

        Ok(viewport)
    }

    // --- accessors ---

    pub fn source(&self) -> &Arc<TileSource> {
        &self.source
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Re-base the clock on `now`, for owners whose time source differs
    /// from the one the viewport was built with. Pending deadlines keep their
    /// absolute instants.
    pub fn reset_clock(&mut self, now: Instant) {
        self.now = now;
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            scroll_x: self.scroll_x,
            scroll_y: self.scroll_y,
            view_width: self.view.width,
            view_height: self.view.height,
            active_zoom_level: self.active,
            transitioning_from_zoom_level: self.transitioning_from,
        }
    }

    pub fn scroll(&self) -> (i64, i64) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn view_size(&self) -> Size {
        self.view
    }

    pub fn center_offset(&self) -> (i64, i64) {
        (self.center_offset_x, self.center_offset_y)
    }

    /// Active-level pixel currently at the center of the view
    pub fn center(&self) -> (i64, i64) {
        (
            self.scroll_x.saturating_add(self.center_offset_x),
            self.scroll_y.saturating_add(self.center_offset_y),
        )
    }

    pub fn active_zoom(&self) -> i32 {
        self.active
    }

    pub fn transitioning_from(&self) -> Option<i32> {
        self.transitioning_from
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning_from.is_some()
    }

    pub fn layer(&self, level: i32) -> Option<&ZoomLayer> {
        self.layer_index(level).map(|idx| &self.layers[idx])
    }

    pub fn active_layer(&self) -> &ZoomLayer {
        &self.layers[self.active_index()]
    }

    pub fn layers(&self) -> &[ZoomLayer] {
        &self.layers
    }

    /// Levels of all visible layers, lowest level first.
    pub fn enabled_levels(&self) -> Vec<i32> {
        self.layers
            .iter()
            .filter(|layer| layer.is_enabled())
            .map(|layer| layer.level())
            .collect()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Number of refresh passes run so far
    pub fn refresh_passes(&self) -> u64 {
        self.refresh_passes
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh.is_pending()
    }

    /// Earliest pending timer deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.settle.deadline(), self.refresh.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn can_zoom_in(&self) -> bool {
        self.active < self.source.zoom_max()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.active > self.source.zoom_min()
    }

    // --- view geometry ---

    /// Apply a new view size and refresh right away.
    pub fn resize(&mut self, width: u32, height: u32) -> usize {
        self.view = Size::new(width, height);
        self.update_center_offsets();
        self.refresh_visible_tiles()
    }

    fn update_center_offsets(&mut self) {
        self.center_offset_x = (self.view.width / 2) as i64;
        self.center_offset_y = (self.view.height / 2) as i64;
    }

    /// Put active-level pixel `(x, y)` at the top left of the view.
    ///
    /// Does not refresh tiles; continuous gestures pair this with
    /// [`schedule_refresh`](Self::schedule_refresh).
    pub fn scroll_to(&mut self, x: i64, y: i64) {
        self.scroll_x = x;
        self.scroll_y = y;
    }

    /// Put active-level pixel `(x, y)` at the center of the view.
    pub fn scroll_center_to(&mut self, x: i64, y: i64) {
        self.scroll_to(
            x.saturating_sub(self.center_offset_x),
            y.saturating_sub(self.center_offset_y),
        );
    }

    pub fn scroll_by(&mut self, dx: i64, dy: i64) {
        self.scroll_to(self.scroll_x.saturating_add(dx), self.scroll_y.saturating_add(dy));
    }

    // --- zoom ---

    /// Switch the active level by `delta`.
    ///
    /// Returns `false` without touching any state when the target level is
    /// outside the source's range or `delta` is zero. Otherwise the new layer
    /// goes on top of the old one, both are laid out at the new level, and
    /// the old one is hidden once the settle delay passes without another
    /// zoom change.
    pub fn change_zoom(&mut self, delta: i32) -> bool {
        let target = match self.active.checked_add(delta) {
            Some(target) if delta != 0 && self.source.is_valid_zoom(target) => target,
            _ => {
                log::debug!("zoom z{} by {} rejected", self.active, delta);
                return false;
            }
        };
        let old = self.active;

        self.settle.cancel();
        for layer in &mut self.layers {
            layer.disable();
        }

        self.active = target;
        let (new_idx, old_idx) = (self.active_index(), self.index_of(old));
        self.layers[new_idx].enable(ACTIVE_LAYER_PRIORITY);
        self.layers[old_idx].enable(FADING_LAYER_PRIORITY);
        self.layers[new_idx].resize_for_effective_zoom(target);
        self.layers[old_idx].resize_for_effective_zoom(target);

        self.settle.arm(self.now, self.options.settle_delay(), old);
        self.transitioning_from = Some(old);
        self.schedule_refresh();

        log::debug!("zoom z{} -> z{}", old, target);
        true
    }

    /// Zoom by `delta` so that old-level pixel `(x, y)` ends up at the top
    /// left of the view.
    pub fn zoom_to_point(&mut self, x: i64, y: i64, delta: i32) -> bool {
        self.zoom_scaled(scale_by_zoom_delta(x, delta), scale_by_zoom_delta(y, delta), delta)
    }

    /// Zoom by `delta` so that old-level pixel `(x, y)` ends up at the center
    /// of the view.
    pub fn zoom_center_to(&mut self, x: i64, y: i64, delta: i32) -> bool {
        self.zoom_scaled(
            scale_by_zoom_delta(x, delta).saturating_sub(self.center_offset_x),
            scale_by_zoom_delta(y, delta).saturating_sub(self.center_offset_y),
            delta,
        )
    }

    fn zoom_scaled(&mut self, scroll_x: i64, scroll_y: i64, delta: i32) -> bool {
        if !self.change_zoom(delta) {
            return false;
        }
        self.scroll_to(scroll_x, scroll_y);
        self.schedule_refresh();
        true
    }

    /// Zoom by `delta` keeping the current center.
    pub fn zoom_centered(&mut self, delta: i32) -> bool {
        let (x, y) = self.center();
        self.zoom_center_to(x, y, delta)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_centered(1)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_centered(-1)
    }

    /// Center on active-level pixel `(x, y)`, zooming in one level first
    /// when possible.
    pub fn center_and_zoom_in(&mut self, x: i64, y: i64) -> bool {
        let zoomed = self.change_zoom(1);
        let (x, y) = if zoomed {
            (scale_by_zoom_delta(x, 1), scale_by_zoom_delta(y, 1))
        } else {
            (x, y)
        };
        self.scroll_center_to(x, y);
        self.schedule_refresh();
        zoomed
    }

    // --- tiles ---

    /// Tiles of the active layer that intersect the view.
    ///
    /// The window is not limited to the image unless `clamp_to_image` is
    /// set; out-of-range requests are left to the tile server. With clamping
    /// on, `None` means the view shows no part of the image.
    pub fn compute_visible_tile_window(&self) -> Option<TileRange> {
        self.window_at(self.active)
    }

    /// The view rectangle expressed in `level`'s native tile grid.
    fn window_at(&self, level: i32) -> Option<TileRange> {
        let dz = level - self.active;
        let (x, y) = (
            scale_by_zoom_delta(self.scroll_x, dz),
            scale_by_zoom_delta(self.scroll_y, dz),
        );
        let (width, height) = (
            scale_dimension(self.view.width, dz),
            scale_dimension(self.view.height, dz),
        );
        let window = TileRange::covering(
            x,
            y,
            width,
            height,
            self.source.tile_width(),
            self.source.tile_height(),
        );
        if !self.options.clamp_to_image {
            return Some(window);
        }
        if x.saturating_add(width as i64) <= 0 || y.saturating_add(height as i64) <= 0 {
            return None;
        }
        window.clamp_to_grid(self.source.tile_columns(level), self.source.tile_rows(level))
    }

    /// Make sure every visible tile exists, column by column.
    ///
    /// While a transition is running the previous layer is filled in too, so
    /// coarse tiles cover whatever the new layer has not loaded yet. Returns
    /// the number of fetches issued.
    pub fn refresh_visible_tiles(&mut self) -> usize {
        self.refresh_passes += 1;
        let view = Some(self.view);

        let window = self.compute_visible_tile_window();
        let idx = self.active_index();
        let mut issued = 0;
        for (col, row) in window.iter().flat_map(TileRange::iter) {
            if self.layers[idx].ensure_tile_with_view(col, row, view, &mut self.fetcher).issued_fetch() {
                issued += 1;
            }
        }

        if let Some(prev) = self.transitioning_from {
            let prev_window = self.window_at(prev);
            let prev_idx = self.index_of(prev);
            for (col, row) in prev_window.iter().flat_map(TileRange::iter) {
                if self.layers[prev_idx]
                    .ensure_tile_with_view(col, row, view, &mut self.fetcher)
                    .issued_fetch()
                {
                    issued += 1;
                }
            }
        }

        log::debug!("refresh z{} {:?}: {} fetches", self.active, window, issued);
        issued
    }

    /// Refresh once the debounce delay passes without another call.
    pub fn schedule_refresh(&mut self) {
        self.schedule_refresh_after(self.options.refresh_debounce());
    }

    pub fn schedule_refresh_after(&mut self, delay: Duration) {
        self.refresh.schedule(self.now, delay);
    }

    /// Refresh immediately unless the scheduled refresh already ran.
    pub fn refresh_now(&mut self) -> bool {
        if self.refresh.run_now_unless_already_fired() {
            self.refresh_visible_tiles();
            true
        } else {
            false
        }
    }

    /// Advance the clock to `now`: settle a finished transition, run a due
    /// refresh and apply whatever fetches completed.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.advance_clock(now);
        let mut report = TickReport::default();

        if let Some(old) = self.settle.poll(self.now) {
            if old != self.active {
                if let Some(idx) = self.layer_index(old) {
                    self.layers[idx].disable();
                }
            }
            self.transitioning_from = None;
            report.settled = Some(old);
            log::debug!("z{} settled, z{} hidden", self.active, old);
        }

        if self.refresh.poll(self.now) {
            report.refreshed = true;
            report.fetches_issued = self.refresh_visible_tiles();
        }

        for completion in self.fetcher.drain_completed() {
            if self.complete_tile(completion.key, completion.outcome) {
                report.tiles_completed += 1;
            }
        }

        report
    }

    /// Apply a finished fetch to the tile it belongs to.
    pub fn complete_tile(&mut self, key: TileKey, outcome: FetchOutcome) -> bool {
        match self.layer_index(key.zoom) {
            Some(idx) => self.layers[idx].complete(key, outcome),
            None => {
                log::warn!("completion for {} outside the zoom range", key);
                false
            }
        }
    }

    // --- links and drawing ---

    /// Deep link for the current center and level.
    pub fn deep_link(&self) -> DeepLink {
        let dz = self.options.reference_zoom - self.active;
        let (x, y) = self.center();
        DeepLink::new(scale_by_zoom_delta(x, dz), scale_by_zoom_delta(y, dz), self.active)
    }

    pub fn fragment(&self) -> String {
        self.deep_link().to_fragment()
    }

    pub fn image_link(&self) -> ImageLink {
        let (x, y) = self.center();
        ImageLink {
            locator: self
                .source
                .build_image_locator(x, y, self.view.width, self.view.height, self.active),
            label: format!("{}x{}@{}", self.view.width, self.view.height, self.active),
        }
    }

    /// Hand every loaded tile of every visible layer to `renderer`, lower
    /// priorities first. Returns the number of tiles drawn.
    pub fn render<R: RenderCollaborator + ?Sized>(&self, renderer: &mut R) -> usize {
        let mut visible: Vec<&ZoomLayer> = self.layers.iter().filter(|l| l.is_enabled()).collect();
        visible.sort_by_key(|layer| layer.priority());

        renderer.begin_frame(&self.state());
        let mut drawn = 0;
        for layer in visible {
            for handle in layer.tiles().filter(|t| t.is_loaded()) {
                let (x, y) = handle.screen_position(self.scroll_x, self.scroll_y);
                renderer.draw_tile(layer.level(), layer.priority(), handle, x, y);
                drawn += 1;
            }
        }
        renderer.end_frame();
        drawn
    }

    // --- internals ---

    /// Move the clock forward to `now`; earlier instants are ignored.
    pub(crate) fn advance_clock(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    fn layer_index(&self, level: i32) -> Option<usize> {
        self.source
            .is_valid_zoom(level)
            .then(|| (level - self.source.zoom_min()) as usize)
    }

    /// Index of a level already known to be valid.
    fn index_of(&self, level: i32) -> usize {
        (level - self.source.zoom_min()) as usize
    }

    fn active_index(&self) -> usize {
        self.index_of(self.active)
    }

    fn active_layer_mut(&mut self) -> &mut ZoomLayer {
        let idx = self.active_index();
        &mut self.layers[idx]
    }
}

impl<F: FetchCollaborator + std::fmt::Debug> std::fmt::Debug for Viewport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("state", &self.state())
            .field("enabled", &self.enabled_levels())
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::types::{TilePayload, TileState};
    use crate::tiles::loader::QueuedFetcher;

    fn source() -> Arc<TileSource> {
        Arc::new(
            TileSource::builder("/tiles")
                .tile_size(256, 256)
                .zoom_range(0, 3)
                .image_size(2048, 2048)
                .build()
                .unwrap(),
        )
    }

    fn viewport(zoom: i32) -> Viewport<QueuedFetcher> {
        let options = ViewportOptions::default()
            .with_view_size(512, 512)
            .with_initial_zoom(zoom)
            .with_initial_center(0, 0);
        let mut vp = Viewport::new(source(), options, QueuedFetcher::new()).unwrap();
        vp.fetcher_mut().take_requests();
        vp
    }

    #[test]
    fn test_new_rejects_out_of_range_zoom() {
        let options = ViewportOptions::default().with_initial_zoom(7);
        let err = Viewport::new(source(), options, QueuedFetcher::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidZoomLevel { level: 7, min: 0, max: 3 }));
    }

    #[test]
    fn test_new_enables_only_initial_layer_and_requests_tiles() {
        let options = ViewportOptions::default().with_view_size(512, 512).with_initial_zoom(1);
        let mut vp = Viewport::new(source(), options, QueuedFetcher::new()).unwrap();

        assert_eq!(vp.layers().len(), 4);
        assert_eq!(vp.enabled_levels(), vec![1]);
        assert_eq!(vp.active_layer().priority(), ACTIVE_LAYER_PRIORITY);
        // the 2048px image is 4096px wide at level 1
        assert_eq!(vp.center(), (2048, 2048));
        assert_eq!(vp.scroll(), (1792, 1792));
        assert_eq!(vp.fetcher_mut().take_requests().len(), 9);
    }

    #[test]
    fn test_visible_window() {
        let mut vp = viewport(0);
        vp.scroll_to(100, 100);
        assert_eq!(vp.compute_visible_tile_window(), Some(TileRange::new(0, 2, 0, 2)));

        vp.scroll_to(-2000, -50);
        let window = vp.compute_visible_tile_window().unwrap();
        assert!(window.start_col <= window.end_col);
        assert_eq!(window, TileRange::new(0, 0, 0, 1));
    }

    #[test]
    fn test_visible_window_clamped_to_image() {
        let options = ViewportOptions {
            clamp_to_image: true,
            ..ViewportOptions::default().with_view_size(512, 512)
        };
        let mut vp = Viewport::new(source(), options, QueuedFetcher::new()).unwrap();
        vp.scroll_to(1900, 1900);
        assert_eq!(vp.compute_visible_tile_window(), Some(TileRange::new(7, 7, 7, 7)));
    }

    #[test]
    fn test_clamped_window_off_image_requests_nothing() {
        let options = ViewportOptions {
            clamp_to_image: true,
            ..ViewportOptions::default().with_view_size(512, 512)
        };
        let mut vp = Viewport::new(source(), options, QueuedFetcher::new()).unwrap();
        vp.fetcher_mut().take_requests();

        for (x, y) in [(3000, 3000), (2048, 0), (-600, 100), (100, -512)] {
            vp.scroll_to(x, y);
            assert_eq!(vp.compute_visible_tile_window(), None, "scroll {:?}", (x, y));
            assert_eq!(vp.refresh_visible_tiles(), 0);
        }
        assert!(vp.fetcher().pending_requests().is_empty());

        vp.scroll_to(-500, -500);
        assert_eq!(vp.compute_visible_tile_window(), Some(TileRange::new(0, 0, 0, 0)));
    }

    #[test]
    fn test_scroll_does_not_refresh() {
        let mut vp = viewport(0);
        let passes = vp.refresh_passes();
        vp.scroll_to(1000, 0);
        vp.scroll_center_to(10, 10);
        vp.scroll_by(5, -5);
        assert_eq!(vp.refresh_passes(), passes);
        assert_eq!(vp.scroll(), (-241, -251));
        assert!(vp.fetcher().pending_requests().is_empty());
    }

    #[test]
    fn test_change_zoom_transition_and_settle() {
        let mut vp = viewport(1);
        let t0 = vp.now();

        assert!(vp.change_zoom(1));
        assert_eq!(vp.active_zoom(), 2);
        assert_eq!(vp.transitioning_from(), Some(1));
        assert_eq!(vp.enabled_levels(), vec![1, 2]);
        assert_eq!(vp.layer(2).unwrap().priority(), ACTIVE_LAYER_PRIORITY);
        assert_eq!(vp.layer(1).unwrap().priority(), FADING_LAYER_PRIORITY);

        let tile = vp.layer(1).unwrap().tile(1, 1).unwrap();
        assert_eq!((tile.width, tile.x), (512, 512));

        let report = vp.tick(t0 + Duration::from_millis(999));
        assert_eq!(report.settled, None);
        let report = vp.tick(t0 + Duration::from_millis(1000));
        assert_eq!(report.settled, Some(1));
        assert_eq!(vp.enabled_levels(), vec![2]);
        assert_eq!(vp.transitioning_from(), None);
    }

    #[test]
    fn test_change_zoom_rejects_out_of_range() {
        let mut vp = viewport(3);
        let before = vp.state();
        assert!(!vp.change_zoom(1));
        assert!(!vp.change_zoom(-4));
        assert!(!vp.change_zoom(0));
        assert_eq!(vp.state(), before);
        assert_eq!(vp.enabled_levels(), vec![3]);
        assert!(!vp.is_refresh_pending());
    }

    #[test]
    fn test_zoom_mid_transition_restarts_settle() {
        let mut vp = viewport(0);
        let t0 = vp.now();

        assert!(vp.change_zoom(1));
        vp.tick(t0 + Duration::from_millis(600));
        assert!(vp.change_zoom(1));
        assert_eq!(vp.enabled_levels(), vec![1, 2]);
        assert_eq!(vp.transitioning_from(), Some(1));

        // the first settle deadline is gone
        let report = vp.tick(t0 + Duration::from_millis(1000));
        assert_eq!(report.settled, None);
        assert_eq!(vp.enabled_levels(), vec![1, 2]);

        let report = vp.tick(t0 + Duration::from_millis(1600));
        assert_eq!(report.settled, Some(1));
        assert_eq!(vp.enabled_levels(), vec![2]);
    }

    #[test]
    fn test_zoom_back_to_fading_layer() {
        let mut vp = viewport(1);
        let t0 = vp.now();
        assert!(vp.change_zoom(1));
        assert!(vp.change_zoom(-1));
        assert_eq!(vp.active_zoom(), 1);
        assert_eq!(vp.enabled_levels(), vec![1, 2]);
        assert_eq!(vp.layer(1).unwrap().effective_zoom(), 1);

        vp.tick(t0 + Duration::from_secs(2));
        assert_eq!(vp.enabled_levels(), vec![1]);
    }

    #[test]
    fn test_zoom_to_point_and_center() {
        let mut vp = viewport(0);
        assert!(vp.zoom_to_point(300, 200, 1));
        assert_eq!(vp.scroll(), (600, 400));

        assert!(vp.zoom_center_to(600, 400, 1));
        assert_eq!(vp.center(), (1200, 800));

        let before = vp.state();
        vp.scroll_to(5, 5);
        assert!(!vp.zoom_to_point(0, 0, 5));
        assert_eq!(vp.scroll(), (5, 5));
        assert_eq!(vp.active_zoom(), before.active_zoom_level);
    }

    #[test]
    fn test_zoom_in_out_keep_center() {
        let mut vp = viewport(1);
        vp.scroll_center_to(400, 300);

        assert!(vp.zoom_in());
        assert_eq!(vp.center(), (800, 600));
        assert!(vp.zoom_out());
        assert_eq!(vp.center(), (400, 300));
        assert!(vp.can_zoom_in());
        assert!(vp.can_zoom_out());
    }

    #[test]
    fn test_center_and_zoom_in_at_max_still_centers() {
        let mut vp = viewport(3);
        assert!(!vp.center_and_zoom_in(1000, 900));
        assert_eq!(vp.center(), (1000, 900));
        assert_eq!(vp.active_zoom(), 3);
        assert!(!vp.can_zoom_in());

        let mut vp = viewport(0);
        assert!(vp.center_and_zoom_in(100, 50));
        assert_eq!(vp.center(), (200, 100));
    }

    #[test]
    fn test_debounced_refresh_collapses_bursts() {
        let mut vp = viewport(0);
        let t0 = vp.now();
        let passes = vp.refresh_passes();

        for i in 0..10u64 {
            let now = t0 + Duration::from_millis(i * 50);
            assert!(!vp.tick(now).refreshed);
            vp.scroll_to(i as i64 * 256, 0);
            vp.schedule_refresh();
        }
        assert_eq!(vp.refresh_passes(), passes);

        let report = vp.tick(t0 + Duration::from_millis(450 + 100));
        assert!(report.refreshed);
        assert_eq!(vp.refresh_passes(), passes + 1);
        assert!(vp.active_layer().contains(9, 0));
        assert!(vp.active_layer().contains(11, 2));
        assert!(!vp.active_layer().contains(5, 0));

        assert!(!vp.refresh_now());
        assert_eq!(vp.refresh_passes(), passes + 1);
    }

    #[test]
    fn test_refresh_now_cancels_pending_refresh() {
        let mut vp = viewport(0);
        let t0 = vp.now();
        vp.scroll_to(512, 0);
        vp.schedule_refresh();

        assert!(vp.refresh_now());
        let passes = vp.refresh_passes();
        assert!(!vp.tick(t0 + Duration::from_secs(1)).refreshed);
        assert_eq!(vp.refresh_passes(), passes);
    }

    #[test]
    fn test_refresh_fills_previous_layer_during_transition() {
        let mut vp = viewport(1);
        vp.scroll_to(0, 0);
        assert!(vp.change_zoom(1));
        vp.fetcher_mut().take_requests();

        vp.scroll_to(1024, 0);
        vp.refresh_visible_tiles();
        let requests = vp.fetcher_mut().take_requests();
        let levels: Vec<i32> = requests.iter().map(|(key, _)| key.zoom).collect();
        assert!(levels.contains(&2));
        assert!(levels.contains(&1));

        // previous layer window is in level 1 pixels: scroll 512, view 256
        let prev = vp.layer(1).unwrap();
        assert!(prev.contains(2, 0));
        assert!(prev.contains(3, 1));
        // and laid out at level 2's scale
        assert_eq!(prev.tile(3, 1).unwrap().width, 512);
    }

    #[test]
    fn test_completions_applied_on_tick() {
        let mut vp = viewport(0);
        vp.fetcher_mut()
            .complete(TileKey::new(0, 0, 0), FetchOutcome::Loaded(TilePayload::new(vec![1, 2])));
        vp.fetcher_mut()
            .complete(TileKey::new(0, 1, 0), FetchOutcome::Failed("HTTP 404".into()));
        vp.fetcher_mut()
            .complete(TileKey::new(9, 0, 0), FetchOutcome::Failed("bogus".into()));

        let now = vp.now();
        let report = vp.tick(now);
        assert_eq!(report.tiles_completed, 2);

        let layer = vp.active_layer();
        assert_eq!(layer.tile(0, 0).unwrap().state, TileState::Loaded);
        assert_eq!(layer.tile(1, 0).unwrap().state, TileState::Pending);
    }

    #[test]
    fn test_resize_updates_offsets_and_refreshes() {
        let mut vp = viewport(0);
        let fetched = vp.resize(1025, 300);
        assert_eq!(vp.center_offset(), (512, 150));
        assert!(fetched > 0);
        assert_eq!(vp.state().view_width, 1025);
    }

    #[test]
    fn test_fragment_and_image_link() {
        let mut vp = viewport(2);
        vp.scroll_center_to(1600, 800);
        assert_eq!(vp.fragment(), "400:200:2");

        let link = vp.image_link();
        assert_eq!(link.locator, "/tiles?cx=1600&cy=800&w=512&h=512&zl=2");
        assert_eq!(link.label, "512x512@2");
    }

    #[test]
    fn test_from_fragment() {
        let options = ViewportOptions::default().with_view_size(512, 512);
        let vp = Viewport::from_fragment(source(), options.clone(), QueuedFetcher::new(), "#400:200:2").unwrap();
        assert_eq!(vp.active_zoom(), 2);
        assert_eq!(vp.center(), (1600, 800));
        assert_eq!(vp.fragment(), "400:200:2");

        let vp = Viewport::from_fragment(source(), options.clone(), QueuedFetcher::new(), "abc:12:9").unwrap();
        assert_eq!(vp.active_zoom(), 0);
        assert_eq!(vp.center(), (1024, 12));
    }

    #[test]
    fn test_from_fragment_far_outside_image() {
        let options = ViewportOptions::default().with_view_size(512, 512);
        let mut vp = Viewport::from_fragment(
            source(),
            options.clone(),
            QueuedFetcher::new(),
            "#9223372036854775807:-9223372036854775807:0",
        )
        .unwrap();
        // held to the image edge at the reference level
        assert_eq!(vp.center(), (2048, 0));
        assert!(!vp.fetcher_mut().take_requests().is_empty());

        let vp = Viewport::from_fragment(source(), options, QueuedFetcher::new(), "#9223372036854775807:5:3").unwrap();
        assert_eq!(vp.active_zoom(), 3);
        assert_eq!(vp.center(), (16384, 40));
    }

    #[test]
    fn test_extreme_scroll_does_not_overflow() {
        let mut vp = viewport(0);
        vp.scroll_to(i64::MAX - 10, i64::MIN + 10);
        vp.scroll_by(100, -100);
        assert_eq!(vp.scroll(), (i64::MAX, i64::MIN));
        assert_eq!(vp.center().0, i64::MAX);

        vp.refresh_visible_tiles();
        vp.scroll_center_to(i64::MIN, i64::MAX);
        assert_eq!(vp.scroll(), (i64::MIN, i64::MAX - 256));
        vp.refresh_visible_tiles();
        let _ = vp.fragment();
    }
}
