use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::Catalog,
    error::{AppError, AppResult},
    services::similarity::SimilarityIndex,
};

/// Resolves a movie title into similar titles
///
/// Looks the title up in the catalog, asks the similarity index for the
/// nearest `k + margin` rows, drops the source movie and repeated titles,
/// and keeps the first `k`. The margin absorbs the source row and any
/// duplicate titles among its neighbors.
#[derive(Clone)]
pub struct RecommendationResolver {
    catalog: Arc<Catalog>,
    index: Arc<dyn SimilarityIndex>,
    margin: usize,
}

impl RecommendationResolver {
    pub fn new(catalog: Arc<Catalog>, index: Arc<dyn SimilarityIndex>, margin: usize) -> Self {
        Self {
            catalog,
            index,
            margin,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Up to `k` distinct titles similar to `source_title`, nearest first
    pub fn recommend(&self, source_title: &str, k: usize) -> AppResult<Vec<String>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "Recommendation count must be at least 1".to_string(),
            ));
        }

        let source = self.catalog.find_by_title(source_title).ok_or_else(|| {
            AppError::NotFound(format!("Movie '{}' not found in catalog", source_title))
        })?;

        let neighbors = self
            .index
            .nearest(source.feature_index, k.saturating_add(self.margin));

        let mut seen: HashSet<&str> = HashSet::new();
        let mut titles = Vec::with_capacity(k);

        for neighbor in neighbors {
            if neighbor.position == source.feature_index {
                continue;
            }
            let Some(movie) = self.catalog.movie_at_feature(neighbor.position) else {
                tracing::debug!(position = neighbor.position, "Neighbor has no catalog entry");
                continue;
            };
            if movie.title == source.title || !seen.insert(movie.title.as_str()) {
                continue;
            }

            titles.push(movie.title.clone());
            if titles.len() == k {
                break;
            }
        }

        tracing::info!(
            source = %source_title,
            requested = k,
            returned = titles.len(),
            "Recommendations resolved"
        );

        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Movie;
    use crate::services::similarity::{CosineIndex, MockSimilarityIndex, Neighbor};

    fn movie(id: u64, title: &str, feature_index: usize) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            feature_index,
        }
    }

    /// "Inception" plus 20 related titles fanning out from it
    fn inception_resolver() -> RecommendationResolver {
        let mut movies = vec![movie(27205, "Inception", 0)];
        let mut vectors = vec![vec![1.0, 0.0]];
        for i in 1..=20u64 {
            movies.push(movie(1000 + i, &format!("Related {}", i), i as usize));
            vectors.push(vec![1.0, i as f32 * 0.1]);
        }

        let catalog = Catalog::new(movies).unwrap();
        let index = CosineIndex::new(vectors).unwrap();
        RecommendationResolver::new(Arc::new(catalog), Arc::new(index), 10)
    }

    fn neighbors(positions: &[usize]) -> Vec<Neighbor> {
        positions
            .iter()
            .enumerate()
            .map(|(rank, &position)| Neighbor {
                position,
                distance: rank as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_inception_returns_exactly_five() {
        let resolver = inception_resolver();
        let titles = resolver.recommend("Inception", 5).unwrap();

        assert_eq!(titles.len(), 5);
        assert!(!titles.contains(&"Inception".to_string()));
        let distinct: HashSet<_> = titles.iter().collect();
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn test_nearest_first_order() {
        let resolver = inception_resolver();
        let titles = resolver.recommend("Inception", 3).unwrap();
        assert_eq!(titles, vec!["Related 1", "Related 2", "Related 3"]);
    }

    #[test]
    fn test_never_exceeds_k_and_never_contains_source() {
        let resolver = inception_resolver();
        for title in resolver.catalog().titles().map(str::to_string).collect::<Vec<_>>() {
            for k in [1, 5, 30] {
                let recs = resolver.recommend(&title, k).unwrap();
                assert!(recs.len() <= k);
                assert!(!recs.contains(&title));
                let distinct: HashSet<_> = recs.iter().collect();
                assert_eq!(distinct.len(), recs.len());
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let resolver = inception_resolver();
        assert_eq!(
            resolver.recommend("Related 7", 5).unwrap(),
            resolver.recommend("Related 7", 5).unwrap()
        );
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let resolver = inception_resolver();
        let result = resolver.recommend("Not A Movie", 5);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let resolver = inception_resolver();
        let result = resolver.recommend("Inception", 0);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_titles_collapse_and_source_title_excluded() {
        let catalog = Catalog::new(vec![
            movie(1, "Solaris", 0),
            movie(2, "Stalker", 1),
            movie(3, "Stalker", 2),
            movie(4, "Solaris", 3),
            movie(5, "Mirror", 4),
        ])
        .unwrap();

        let mut index = MockSimilarityIndex::new();
        index
            .expect_nearest()
            .withf(|&position, &count| position == 0 && count == 12)
            .returning(|_, _| neighbors(&[0, 1, 2, 3, 4]));

        let resolver = RecommendationResolver::new(Arc::new(catalog), Arc::new(index), 10);
        let titles = resolver.recommend("Solaris", 2).unwrap();

        assert_eq!(titles, vec!["Stalker", "Mirror"]);
    }

    #[test]
    fn test_short_neighbor_list_returns_fewer_than_k() {
        let catalog = Catalog::new(vec![movie(1, "Heat", 0), movie(2, "Ronin", 1)]).unwrap();

        let mut index = MockSimilarityIndex::new();
        index
            .expect_nearest()
            .returning(|_, _| neighbors(&[0, 1]));

        let resolver = RecommendationResolver::new(Arc::new(catalog), Arc::new(index), 10);
        assert_eq!(resolver.recommend("Heat", 5).unwrap(), vec!["Ronin"]);
    }

    #[test]
    fn test_neighbors_without_catalog_entry_skipped() {
        let catalog = Catalog::new(vec![movie(1, "Heat", 0), movie(2, "Ronin", 2)]).unwrap();

        let mut index = MockSimilarityIndex::new();
        index
            .expect_nearest()
            .returning(|_, _| neighbors(&[0, 1, 2]));

        let resolver = RecommendationResolver::new(Arc::new(catalog), Arc::new(index), 10);
        assert_eq!(resolver.recommend("Heat", 5).unwrap(), vec!["Ronin"]);
    }

    #[test]
    fn test_huge_margin_saturates_neighbor_count() {
        let catalog = Catalog::new(vec![movie(1, "Heat", 0), movie(2, "Ronin", 1)]).unwrap();

        let mut index = MockSimilarityIndex::new();
        index
            .expect_nearest()
            .withf(|&position, &count| position == 0 && count == usize::MAX)
            .returning(|_, _| neighbors(&[0, 1]));

        let resolver =
            RecommendationResolver::new(Arc::new(catalog), Arc::new(index), usize::MAX - 1);
        assert_eq!(resolver.recommend("Heat", 5).unwrap(), vec!["Ronin"]);
    }
}
