//! Configuration for viewport timing and behavior
//!
//! Options can be built from a preset profile, tweaked field by field, or
//! deserialized from JSON handed over by the page that embeds the viewer.

use crate::core::constants::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_REFRESH_DEBOUNCE_MS, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_VIEW_SIZE,
};
use crate::core::geo::Size;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewportProfile {
    #[default]
    Balanced,
    /// Short delays: tiles are requested sooner, at the cost of more
    /// requests during long drags.
    Responsive,
    /// Long delays: fewer requests on slow tile servers.
    Conservative,
    Custom(ViewportOptions),
}

impl ViewportProfile {
    pub fn resolve(&self) -> ViewportOptions {
        match self {
            Self::Balanced => ViewportOptions::default(),
            Self::Responsive => ViewportOptions {
                settle_delay_ms: 500,
                refresh_debounce_ms: 50,
                frame_interval_ms: 16,
                ..ViewportOptions::default()
            },
            Self::Conservative => ViewportOptions {
                settle_delay_ms: 1500,
                refresh_debounce_ms: 250,
                frame_interval_ms: 33,
                clamp_to_image: true,
                ..ViewportOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// Delay before the previous zoom layer is hidden after a zoom change
    pub settle_delay_ms: u64,
    /// Debounce delay for tile refreshes during continuous gestures
    pub refresh_debounce_ms: u64,
    /// Polling interval of the runtime driver
    pub frame_interval_ms: u64,
    pub view_width: u32,
    pub view_height: u32,
    /// Zoom level shown when no deep link says otherwise
    pub initial_zoom: i32,
    /// Initial center in reference-frame pixels; the image center if unset
    pub initial_center: Option<(i64, i64)>,
    /// Zoom level whose pixel space deep-link coordinates are expressed in
    pub reference_zoom: i32,
    /// Restrict the visible window to tiles inside the image
    pub clamp_to_image: bool,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            refresh_debounce_ms: DEFAULT_REFRESH_DEBOUNCE_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            view_width: DEFAULT_VIEW_SIZE.0,
            view_height: DEFAULT_VIEW_SIZE.1,
            initial_zoom: 0,
            initial_center: None,
            reference_zoom: 0,
            clamp_to_image: false,
        }
    }
}

impl ViewportOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn view_size(&self) -> Size {
        Size::new(self.view_width, self.view_height)
    }

    pub fn with_view_size(mut self, width: u32, height: u32) -> Self {
        self.view_width = width;
        self.view_height = height;
        self
    }

    pub fn with_initial_zoom(mut self, zoom: i32) -> Self {
        self.initial_zoom = zoom;
        self
    }

    pub fn with_initial_center(mut self, x: i64, y: i64) -> Self {
        self.initial_center = Some((x, y));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.view_size().is_empty() {
            return Err(Error::Config(format!(
                "viewport size must be positive, got {}x{}",
                self.view_width, self.view_height
            )));
        }
        Ok(())
    }
}
