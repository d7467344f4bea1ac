pub mod config;
pub mod constants;
pub mod debounce;
pub mod deeplink;
pub mod geo;
pub mod scale;
pub mod viewport;

pub use config::{ViewportOptions, ViewportProfile};
pub use debounce::{DebounceScheduler, Timer};
pub use deeplink::DeepLink;
pub use geo::{Size, TileKey, TileRange};
pub use scale::scale_by_zoom_delta;
pub use viewport::{ImageLink, TickReport, Viewport, ViewportState};
