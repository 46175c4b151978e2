use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    db::{CatalogArtifact, FavoritesStore},
    error::AppResult,
    services::{PosterGateway, RecommendationResolver, TmdbPosterGateway},
    session::{SessionContext, SessionState},
};

/// Shared application state
///
/// The process serves a single session. Handlers take the write lock for
/// the whole event, so interactions are applied one at a time.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<SessionContext>,
    pub session: Arc<RwLock<SessionState>>,
}

impl AppState {
    /// Starts the session, loading persisted favorites
    ///
    /// The first catalog title is preselected, as in the title picker.
    pub fn new(context: SessionContext) -> Self {
        let initial_title = context
            .resolver
            .catalog()
            .titles()
            .next()
            .map(str::to_string);
        let session = SessionState::start(&context.store, initial_title);

        Self {
            context: Arc::new(context),
            session: Arc::new(RwLock::new(session)),
        }
    }

    /// Loads the catalog artifact and wires up collaborators from config
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let (catalog, index) = CatalogArtifact::load(&config.catalog_path)?.into_parts()?;

        tracing::info!(
            movies = catalog.len(),
            dimension = index.dimension(),
            "Catalog ready"
        );

        let resolver =
            RecommendationResolver::new(Arc::new(catalog), Arc::new(index), config.neighbor_margin);

        let posters: Arc<dyn PosterGateway> = Arc::new(TmdbPosterGateway::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.poster_base_url.clone(),
            config.placeholder_poster_url.clone(),
        ));

        Ok(Self::new(SessionContext {
            resolver,
            posters,
            store: FavoritesStore::new(&config.favorites_path),
            recommendation_count: config.recommendation_count,
        }))
    }
}
