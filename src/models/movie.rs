use serde::{Deserialize, Serialize};

/// A catalog entry
///
/// `feature_index` is the row of this movie's vector in the precomputed
/// feature table that backs the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub feature_index: usize,
}

/// One recommended movie as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationCard {
    /// `None` when the candidate title could not be found in the catalog
    pub movie_id: Option<u64>,
    pub title: String,
    pub poster_url: String,
    /// Current state of the favorite toggle for this card
    #[serde(default)]
    pub favorited: bool,
}

/// TMDB `GET /movie/{id}` response, reduced to the fields we read
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_deserialization() {
        let json = r#"{ "id": 27205, "title": "Inception", "feature_index": 3 }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 27205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.feature_index, 3);
    }

    #[test]
    fn test_tmdb_details_with_poster() {
        let json = r#"{ "id": 27205, "title": "Inception", "poster_path": "/9gk7adHYeDvHkCSEqAvQNLV5Uge.jpg" }"#;
        let details: TmdbMovieDetails = serde_json::from_str(json).unwrap();
        assert_eq!(
            details.poster_path.as_deref(),
            Some("/9gk7adHYeDvHkCSEqAvQNLV5Uge.jpg")
        );
    }

    #[test]
    fn test_tmdb_details_null_or_missing_poster() {
        let null: TmdbMovieDetails = serde_json::from_str(r#"{ "poster_path": null }"#).unwrap();
        assert_eq!(null.poster_path, None);

        let missing: TmdbMovieDetails = serde_json::from_str(r#"{ "id": 1 }"#).unwrap();
        assert_eq!(missing.poster_path, None);
    }

    #[test]
    fn test_card_favorited_defaults_to_false() {
        let json = r#"{ "movie_id": 157336, "title": "Interstellar", "poster_url": "https://x/y.jpg" }"#;
        let card: RecommendationCard = serde_json::from_str(json).unwrap();
        assert!(!card.favorited);
    }
}
