pub mod basemap;
pub mod choropleth;
pub mod geometry;
pub mod loader;
pub mod projection;
pub mod spikes;
pub mod surface;
pub mod view;

pub use projection::Viewport;
pub use surface::{MapEvent, MapSurface, SurfaceError};
pub use view::MapView;
