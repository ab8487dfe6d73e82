//! Map rendering: tile sources, the tile cache/download engine, and the
//! interactive view with the alert overlay.

pub mod layer;
pub mod sources;
pub mod view;

pub use layer::TileLayer;
pub use sources::{OpenStreetMapSource, RainViewerSource, TileSource};
pub use view::{MapView, OverlayShape};
