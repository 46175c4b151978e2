//! Poster artwork lookup against TMDB
//!
//! The gateway is total: every failure (transport error, non-2xx status,
//! unparseable body, missing poster) resolves to the placeholder image, so
//! callers never have to handle an error from it. One attempt per call, no
//! retries, and no caching.
use reqwest::Client as HttpClient;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::TmdbMovieDetails,
};

/// Resolves a catalog movie id into a displayable poster URL
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterGateway: Send + Sync {
    /// Poster URL for `movie_id`, or the placeholder on any failure
    async fn fetch_poster_url(&self, movie_id: u64) -> String;

    /// Image used whenever no poster can be resolved
    fn placeholder_url(&self) -> String;
}

/// Fetches posters for several movies concurrently
///
/// Output order matches `movie_ids`. A `None` id (a title missing from the
/// catalog) gets the placeholder without a request.
pub async fn fetch_poster_batch(
    gateway: Arc<dyn PosterGateway>,
    movie_ids: &[Option<u64>],
) -> Vec<String> {
    let mut tasks = Vec::with_capacity(movie_ids.len());

    for movie_id in movie_ids.iter().copied() {
        let gateway = gateway.clone();
        let task = tokio::spawn(async move {
            match movie_id {
                Some(id) => gateway.fetch_poster_url(id).await,
                None => gateway.placeholder_url(),
            }
        });
        tasks.push(task);
    }

    let mut urls = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(url) => urls.push(url),
            Err(e) => {
                tracing::error!(error = %e, "Poster task join error");
                urls.push(gateway.placeholder_url());
            }
        }
    }

    urls
}

#[derive(Clone)]
pub struct TmdbPosterGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    poster_base_url: String,
    placeholder_url: String,
}

impl TmdbPosterGateway {
    pub fn new(
        api_key: String,
        api_url: String,
        poster_base_url: String,
        placeholder_url: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            poster_base_url,
            placeholder_url,
        }
    }

    /// Replaces the HTTP client, e.g. to set a timeout
    pub fn with_client(mut self, http_client: HttpClient) -> Self {
        self.http_client = http_client;
        self
    }

    /// Joins the poster base URL and a TMDB poster path
    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.poster_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    /// Asks TMDB for the movie's poster path
    async fn request_poster_path(&self, movie_id: u64) -> AppResult<Option<String>> {
        let url = format!("{}/movie/{}", self.api_url.trim_end_matches('/'), movie_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let details: TmdbMovieDetails = response.json().await?;
        Ok(details.poster_path.filter(|p| !p.trim().is_empty()))
    }
}

#[async_trait::async_trait]
impl PosterGateway for TmdbPosterGateway {
    async fn fetch_poster_url(&self, movie_id: u64) -> String {
        match self.request_poster_path(movie_id).await {
            Ok(Some(path)) => {
                tracing::debug!(movie_id, poster_path = %path, "Poster resolved");
                self.poster_url(&path)
            }
            Ok(None) => {
                tracing::debug!(movie_id, "Movie has no poster");
                self.placeholder_url.clone()
            }
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Poster fetch failed, using placeholder");
                self.placeholder_url.clone()
            }
        }
    }

    fn placeholder_url(&self) -> String {
        self.placeholder_url.clone()
    }
}
