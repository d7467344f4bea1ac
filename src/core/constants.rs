//! Engine-wide defaults kept in a single place.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// How long the previous zoom layer stays visible underneath the new one.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Quiet period after the last scroll event before visible tiles are refreshed.
pub const DEFAULT_REFRESH_DEBOUNCE_MS: u64 = 100;

/// Interval at which the runtime driver polls timers and fetch completions.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Stacking priority of the active zoom layer.
pub const ACTIVE_LAYER_PRIORITY: i32 = 11;

/// Stacking priority of the layer fading out beneath the active one.
pub const FADING_LAYER_PRIORITY: i32 = 10;

/// Default viewport size used before the host reports a real one.
pub const DEFAULT_VIEW_SIZE: (u32, u32) = (800, 600);
