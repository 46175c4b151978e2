pub mod posters;
pub mod recommendations;
pub mod similarity;

pub use posters::{fetch_poster_batch, PosterGateway, TmdbPosterGateway};
pub use recommendations::RecommendationResolver;
pub use similarity::{CosineIndex, Neighbor, SimilarityIndex};
