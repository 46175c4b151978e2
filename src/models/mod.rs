pub mod favorites;
pub mod movie;

pub use favorites::FavoritesMap;
pub use movie::{Movie, RecommendationCard, TmdbMovieDetails};
