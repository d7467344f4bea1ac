use serde::{Deserialize, Serialize};

/// Input events the viewport reacts to.
///
/// Pointer offsets are in view pixels relative to the top-left corner of
/// the viewport. Wheel deltas are already normalized by the host: only the
/// sign is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerEvent {
    /// Start of a drag on the tile surface
    DragStart,
    /// Pointer moved by `(dx, dy)` while dragging
    DragMove { dx: i64, dy: i64 },
    /// Pointer released
    DragEnd,
    /// Scroll wheel over the view; positive zooms in
    Wheel { delta: i32, offset_x: i64, offset_y: i64 },
    DoubleClick { offset_x: i64, offset_y: i64 },
    /// Viewport element resized
    Resize { width: u32, height: u32 },
    /// Zoom-in button
    ZoomIn,
    /// Zoom-out button
    ZoomOut,
}

impl ViewerEvent {
    /// View-relative pointer position carried by the event, if any
    pub fn offset(&self) -> Option<(i64, i64)> {
        match self {
            ViewerEvent::Wheel { offset_x, offset_y, .. } => Some((*offset_x, *offset_y)),
            ViewerEvent::DoubleClick { offset_x, offset_y } => Some((*offset_x, *offset_y)),
            _ => None,
        }
    }

    pub fn is_drag_event(&self) -> bool {
        matches!(
            self,
            ViewerEvent::DragStart | ViewerEvent::DragMove { .. } | ViewerEvent::DragEnd
        )
    }

    /// Whether the event may change the zoom level
    pub fn is_zoom_event(&self) -> bool {
        matches!(
            self,
            ViewerEvent::Wheel { .. }
                | ViewerEvent::DoubleClick { .. }
                | ViewerEvent::ZoomIn
                | ViewerEvent::ZoomOut
        )
    }
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl From<bool> for EventHandled {
    fn from(handled: bool) -> Self {
        if handled {
            EventHandled::Handled
        } else {
            EventHandled::NotHandled
        }
    }
}
