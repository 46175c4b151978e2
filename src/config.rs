use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key used for poster lookups
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL that poster paths are appended to
    #[serde(default = "default_poster_base_url")]
    pub poster_base_url: String,

    /// Image shown when a poster cannot be resolved
    #[serde(default = "default_placeholder_poster_url")]
    pub placeholder_poster_url: String,

    /// Precomputed catalog artifact (movie table + feature vectors)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Persisted favorites file
    #[serde(default = "default_favorites_path")]
    pub favorites_path: String,

    /// Number of recommendations shown per query
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Extra neighbors requested to make up for the source movie and duplicate titles
    #[serde(default = "default_neighbor_margin")]
    pub neighbor_margin: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_poster_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_placeholder_poster_url() -> String {
    "https://via.placeholder.com/150".to_string()
}

fn default_catalog_path() -> String {
    "processed_data/catalog.json".to_string()
}

fn default_favorites_path() -> String {
    "processed_data/favorites.json".to_string()
}

fn default_recommendation_count() -> usize {
    5
}

fn default_neighbor_margin() -> usize {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
