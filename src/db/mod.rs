pub mod catalog;
pub mod favorites;

pub use catalog::{Catalog, CatalogArtifact};
pub use favorites::{FavoritesStore, LoadOutcome};
