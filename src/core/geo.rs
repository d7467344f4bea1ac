use serde::{Deserialize, Serialize};

/// Identifies a single tile: a grid cell at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: i32,
    pub col: u32,
    pub row: u32,
}

impl TileKey {
    pub fn new(zoom: i32, col: u32, row: u32) -> Self {
        Self { zoom, col, row }
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tile_{}_{}_{}", self.zoom, self.col, self.row)
    }
}

/// A width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Inclusive range of tile columns and rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub start_col: u32,
    pub end_col: u32,
    pub start_row: u32,
    pub end_row: u32,
}

impl TileRange {
    pub fn new(start_col: u32, end_col: u32, start_row: u32, end_row: u32) -> Self {
        Self {
            start_col,
            end_col,
            start_row,
            end_row,
        }
    }

    /// Computes the tiles whose rectangles intersect the pixel rectangle at
    /// `(x, y)` of the given size.
    ///
    /// Starts are clamped at zero and ends are raised to the starts, so the
    /// range is never inverted even for a rectangle lying entirely at
    /// negative coordinates.
    pub fn covering(x: i64, y: i64, width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        let tw = tile_width.max(1) as i64;
        let th = tile_height.max(1) as i64;

        let start_col = x.div_euclid(tw).max(0);
        let start_row = y.div_euclid(th).max(0);
        let end_col = x.saturating_add(width as i64).div_euclid(tw).max(start_col);
        let end_row = y.saturating_add(height as i64).div_euclid(th).max(start_row);

        Self::new(
            to_index(start_col),
            to_index(end_col),
            to_index(start_row),
            to_index(end_row),
        )
    }

    /// Clamps the range to a grid of `cols` × `rows` tiles.
    ///
    /// Returns `None` when the range lies entirely outside the grid.
    pub fn clamp_to_grid(&self, cols: u32, rows: u32) -> Option<Self> {
        if self.start_col >= cols || self.start_row >= rows {
            return None;
        }
        Some(Self::new(
            self.start_col,
            self.end_col.min(cols - 1),
            self.start_row,
            self.end_row.min(rows - 1),
        ))
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        col >= self.start_col && col <= self.end_col && row >= self.start_row && row <= self.end_row
    }

    pub fn columns(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    pub fn rows(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Iterates `(col, row)` pairs column by column.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (start_row, end_row) = (self.start_row, self.end_row);
        (self.start_col..=self.end_col)
            .flat_map(move |col| (start_row..=end_row).map(move |row| (col, row)))
    }
}

fn to_index(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}
