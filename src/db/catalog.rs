use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::similarity::CosineIndex,
};

/// Precomputed catalog artifact as written by the offline pipeline
#[derive(Debug, Deserialize)]
pub struct CatalogArtifact {
    pub movies: Vec<Movie>,
    pub vectors: Vec<Vec<f32>>,
}

impl CatalogArtifact {
    /// Reads the artifact from disk
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Catalog(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let artifact: CatalogArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::Catalog(format!("Cannot parse {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            movies = artifact.movies.len(),
            vectors = artifact.vectors.len(),
            "Loaded catalog artifact"
        );

        Ok(artifact)
    }

    /// Validates the artifact and splits it into the catalog and its index
    pub fn into_parts(self) -> AppResult<(Catalog, CosineIndex)> {
        for movie in &self.movies {
            if movie.feature_index >= self.vectors.len() {
                return Err(AppError::Catalog(format!(
                    "Movie {} ('{}') points at vector {} but only {} vectors exist",
                    movie.id,
                    movie.title,
                    movie.feature_index,
                    self.vectors.len()
                )));
            }
        }

        let index = CosineIndex::new(self.vectors)?;
        let catalog = Catalog::new(self.movies)?;
        Ok((catalog, index))
    }
}

/// Read-only movie table, loaded once per process
#[derive(Debug, Clone)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_feature: HashMap<usize, usize>,
}

impl Catalog {
    pub fn new(movies: Vec<Movie>) -> AppResult<Self> {
        let mut by_feature = HashMap::with_capacity(movies.len());

        for (pos, movie) in movies.iter().enumerate() {
            if let Some(previous) = by_feature.insert(movie.feature_index, pos) {
                return Err(AppError::Catalog(format!(
                    "Movies {} and {} share feature index {}",
                    movies[previous].id, movie.id, movie.feature_index
                )));
            }
        }

        Ok(Self { movies, by_feature })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Exact, case-sensitive lookup; the first movie wins when titles repeat
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.title == title)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.find_by_title(title).is_some()
    }

    /// Movie whose vector sits at `feature_index`
    pub fn movie_at_feature(&self, feature_index: usize) -> Option<&Movie> {
        self.by_feature
            .get(&feature_index)
            .map(|&pos| &self.movies[pos])
    }

    /// Titles in catalog order, as offered by the title picker
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }
}
