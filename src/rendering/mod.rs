//! Rendering collaborator interface
//!
//! The viewport never draws anything itself. Each frame it hands the loaded
//! tiles of every visible layer to a [`RenderCollaborator`], lowest stacking
//! priority first, with screen positions already resolved against the
//! current scroll offset.

use crate::core::geo::TileKey;
use crate::core::viewport::ViewportState;
use crate::layers::types::TileHandle;

pub trait RenderCollaborator {
    fn begin_frame(&mut self, state: &ViewportState);

    /// Draw one tile with its top-left corner at `(screen_x, screen_y)`.
    ///
    /// `handle.width` and `handle.height` are the on-screen size, which
    /// differs from the tile's native size while its layer is scaled for a
    /// zoom transition.
    fn draw_tile(&mut self, level: i32, priority: i32, handle: &TileHandle, screen_x: i64, screen_y: i64);

    fn end_frame(&mut self) {}
}

/// A tile as drawn in a recorded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnTile {
    pub key: TileKey,
    pub level: i32,
    pub priority: i32,
    pub screen_x: i64,
    pub screen_y: i64,
    pub width: u32,
    pub height: u32,
}

/// Headless renderer that keeps the last frame as a draw list.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pub state: Option<ViewportState>,
    pub tiles: Vec<DrawnTile>,
    pub frames: u64,
    in_frame: bool,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles drawn for `level` in the last frame
    pub fn tiles_at(&self, level: i32) -> impl Iterator<Item = &DrawnTile> {
        self.tiles.iter().filter(move |t| t.level == level)
    }

    /// Whether any tile of the last frame covers screen pixel `(x, y)`
    pub fn covers(&self, x: i64, y: i64) -> bool {
        self.tiles.iter().any(|t| {
            x >= t.screen_x
                && y >= t.screen_y
                && x < t.screen_x + t.width as i64
                && y < t.screen_y + t.height as i64
        })
    }
}

impl RenderCollaborator for FrameRecorder {
    fn begin_frame(&mut self, state: &ViewportState) {
        self.state = Some(*state);
        self.tiles.clear();
        self.in_frame = true;
    }

    fn draw_tile(&mut self, level: i32, priority: i32, handle: &TileHandle, screen_x: i64, screen_y: i64) {
        if !self.in_frame {
            log::warn!("draw_tile for {} outside a frame", handle.key);
        }
        self.tiles.push(DrawnTile {
            key: handle.key,
            level,
            priority,
            screen_x,
            screen_y,
            width: handle.width,
            height: handle.height,
        });
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.frames += 1;
    }
}
