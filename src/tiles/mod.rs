pub mod loader;
pub mod source;

// Re-exports for convenience
pub use loader::{FetchCollaborator, QueuedFetcher};
#[cfg(feature = "tokio-runtime")]
pub use loader::HttpTileLoader;
pub use source::{LocatorTemplate, TileSource, TileSourceBuilder, TileSourceConfig, ZoomParam};
