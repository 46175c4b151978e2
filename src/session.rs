//! Per-session state and the events that drive it
//!
//! Every user interaction is one [`SessionEvent`] dispatched against the
//! [`SessionState`]; the UI then re-renders from a fresh [`SessionView`].
//! The recommendation view is transient and rebuilt on every
//! "show recommendations". The favorites map is the only durable part and
//! is written to disk after each confirmed change.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::{
    db::FavoritesStore,
    error::{AppError, AppResult},
    models::{FavoritesMap, RecommendationCard},
    services::{fetch_poster_batch, PosterGateway, RecommendationResolver},
};

/// Identity of one favorite toggle: the movie the recommendations were
/// made for and the recommended candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub source: String,
    pub candidate: String,
}

impl SelectionKey {
    pub fn new(source: &str, candidate: &str) -> Self {
        Self {
            source: source.to_string(),
            candidate: candidate.to_string(),
        }
    }
}

impl Display for SelectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "checkbox-{}-{}", self.source, self.candidate)
    }
}

/// Message shown to the user once, on the next render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Warning(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SelectTitle(String),
    ShowRecommendations,
    ToggleFavorite { candidate: String, checked: bool },
    ConfirmSelections,
    RemoveFavorite(String),
}

/// Collaborators a session needs to process events
#[derive(Clone)]
pub struct SessionContext {
    pub resolver: RecommendationResolver,
    pub posters: Arc<dyn PosterGateway>,
    pub store: FavoritesStore,
    pub recommendation_count: usize,
}

/// Cards resolved for one source movie
#[derive(Debug, Clone)]
pub struct RecommendationView {
    source: String,
    cards: Vec<RecommendationCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteEntry {
    pub source: String,
    pub title: String,
}

/// Everything the UI needs to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub selected: Option<String>,
    pub recommendations: Vec<RecommendationCard>,
    /// `None` when the selected movie has no favorites entry at all
    pub selected_favorites: Option<Vec<String>>,
    pub all_favorites: Vec<FavoriteEntry>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    favorites: FavoritesMap,
    selected: Option<String>,
    recommendations: Option<RecommendationView>,
    selections: HashMap<SelectionKey, bool>,
    notices: Vec<Notice>,
}

impl SessionState {
    pub fn new(favorites: FavoritesMap) -> Self {
        Self {
            favorites,
            ..Default::default()
        }
    }

    /// Starts a session from the persisted favorites
    ///
    /// A file that fails to load leaves the session with no favorites and a
    /// warning for the first render.
    pub fn start(store: &FavoritesStore, initial_title: Option<String>) -> Self {
        let outcome = store.load();
        let mut state = Self::new(outcome.favorites);
        state.selected = initial_title;

        if let Some(e) = outcome.error {
            state
                .notices
                .push(Notice::Warning(format!("Error loading favorites: {}", e)));
        }

        state
    }

    pub fn favorites(&self) -> &FavoritesMap {
        &self.favorites
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_checked(&self, source: &str, candidate: &str) -> bool {
        self.selections
            .get(&SelectionKey::new(source, candidate))
            .copied()
            .unwrap_or(false)
    }

    /// Applies one user interaction
    pub async fn handle(&mut self, ctx: &SessionContext, event: SessionEvent) -> AppResult<()> {
        tracing::debug!(event = ?event, "Handling session event");

        match event {
            SessionEvent::SelectTitle(title) => self.select_title(ctx, title),
            SessionEvent::ShowRecommendations => self.show_recommendations(ctx).await,
            SessionEvent::ToggleFavorite { candidate, checked } => {
                self.toggle_favorite(&candidate, checked)
            }
            SessionEvent::ConfirmSelections => self.confirm_selections(ctx),
            SessionEvent::RemoveFavorite(title) => {
                self.remove_favorite(ctx, &title);
                Ok(())
            }
        }
    }

    fn select_title(&mut self, ctx: &SessionContext, title: String) -> AppResult<()> {
        if !ctx.resolver.catalog().contains_title(&title) {
            return Err(AppError::NotFound(format!(
                "Movie '{}' not found in catalog",
                title
            )));
        }

        if self
            .recommendations
            .as_ref()
            .is_some_and(|view| view.source != title)
        {
            self.recommendations = None;
        }
        self.selected = Some(title);
        Ok(())
    }

    async fn show_recommendations(&mut self, ctx: &SessionContext) -> AppResult<()> {
        let source = self
            .selected
            .clone()
            .ok_or_else(|| AppError::InvalidInput("No movie selected".to_string()))?;

        let prepared = Self::prepare_recommendations(ctx, &source).await;
        self.apply_recommendations(&source, prepared)
    }

    /// Resolves the candidates for `source` and fetches their posters
    ///
    /// Reads no session state, so it can run while the session is unlocked.
    pub async fn prepare_recommendations(
        ctx: &SessionContext,
        source: &str,
    ) -> AppResult<RecommendationView> {
        let titles = ctx.resolver.recommend(source, ctx.recommendation_count)?;

        let movie_ids: Vec<Option<u64>> = titles
            .iter()
            .map(|title| ctx.resolver.catalog().find_by_title(title).map(|m| m.id))
            .collect();
        let posters = fetch_poster_batch(ctx.posters.clone(), &movie_ids).await;

        let cards = titles
            .into_iter()
            .zip(movie_ids)
            .zip(posters)
            .map(|((title, movie_id), poster_url)| RecommendationCard {
                movie_id,
                title,
                poster_url,
                favorited: false,
            })
            .collect();

        Ok(RecommendationView {
            source: source.to_string(),
            cards,
        })
    }

    /// Installs recommendations prepared for `source`
    ///
    /// Results for a title that is no longer selected are dropped. A failed
    /// resolution clears the current view and is handed back to the caller.
    pub fn apply_recommendations(
        &mut self,
        source: &str,
        prepared: AppResult<RecommendationView>,
    ) -> AppResult<()> {
        if self.selected.as_deref() != Some(source) {
            tracing::debug!(source = %source, "Selection changed, dropping recommendations");
            return Ok(());
        }

        match prepared {
            Ok(view) => {
                self.recommendations = Some(view);
                Ok(())
            }
            Err(e) => {
                self.recommendations = None;
                Err(e)
            }
        }
    }

    fn toggle_favorite(&mut self, candidate: &str, checked: bool) -> AppResult<()> {
        let view = self
            .recommendations
            .as_ref()
            .ok_or_else(|| AppError::InvalidInput("No recommendations shown".to_string()))?;

        if !view.cards.iter().any(|card| card.title == candidate) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not among the current recommendations",
                candidate
            )));
        }

        let key = SelectionKey::new(&view.source, candidate);
        tracing::debug!(key = %key, checked, "Favorite toggled");
        self.selections.insert(key, checked);
        Ok(())
    }

    fn confirm_selections(&mut self, ctx: &SessionContext) -> AppResult<()> {
        let view = self
            .recommendations
            .as_ref()
            .ok_or_else(|| AppError::InvalidInput("No recommendations shown".to_string()))?;

        let chosen: Vec<String> = view
            .cards
            .iter()
            .filter(|card| self.is_checked(&view.source, &card.title))
            .map(|card| card.title.clone())
            .collect();
        let source = view.source.clone();

        let added = self.favorites.add_favorites(&source, chosen);
        tracing::info!(source = %source, added, "Selections confirmed");

        match ctx.store.persist(&self.favorites) {
            Ok(()) => self.notices.push(Notice::Success(format!(
                "Favorites updated for '{}'!",
                source
            ))),
            Err(e) => self.notices.push(Notice::Warning(format!(
                "Favorites updated for '{}' but could not be saved: {}",
                source, e
            ))),
        }

        Ok(())
    }

    fn remove_favorite(&mut self, ctx: &SessionContext, title: &str) {
        let Some(source) = self.favorites.remove_favorite(title) else {
            tracing::debug!(title = %title, "Favorite not present, nothing removed");
            return;
        };

        tracing::info!(title = %title, source = %source, "Favorite removed");

        if let Err(e) = ctx.store.persist(&self.favorites) {
            self.notices.push(Notice::Warning(format!(
                "Removed '{}' but could not save favorites: {}",
                title, e
            )));
        }
    }

    /// Builds the view for the current state and hands over pending notices
    pub fn render(&mut self) -> SessionView {
        let recommendations = self
            .recommendations
            .as_ref()
            .map(|view| {
                view.cards
                    .iter()
                    .map(|card| RecommendationCard {
                        favorited: self.is_checked(&view.source, &card.title),
                        ..card.clone()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let selected_favorites = self
            .selected
            .as_deref()
            .and_then(|title| self.favorites.get(title))
            .map(<[String]>::to_vec);

        let all_favorites = self
            .favorites
            .pairs()
            .into_iter()
            .map(|(source, title)| FavoriteEntry { source, title })
            .collect();

        SessionView {
            selected: self.selected.clone(),
            recommendations,
            selected_favorites,
            all_favorites,
            notices: std::mem::take(&mut self.notices),
        }
    }
}
