use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{FavoritesMap, Movie},
    session::{SessionEvent, SessionState, SessionView},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SelectTitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub candidate: String,
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: u64,
    pub title: String,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
        }
    }
}

/// Applies one event to the session and re-renders it
async fn dispatch(
    state: &AppState,
    request_id: RequestId,
    event: SessionEvent,
) -> AppResult<Json<SessionView>> {
    let mut session = state.session.write().await;

    if let Err(e) = session.handle(&state.context, event).await {
        tracing::warn!(request_id = %request_id, error = %e, "Session event rejected");
        return Err(e);
    }

    Ok(Json(session.render()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Catalog titles for the title picker
pub async fn list_movies(State(state): State<AppState>) -> Json<Vec<MovieResponse>> {
    let movies = state
        .context
        .resolver
        .catalog()
        .movies()
        .iter()
        .map(MovieResponse::from)
        .collect();
    Json(movies)
}

/// Current session view
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.write().await;
    Json(session.render())
}

/// Changes the selected movie
pub async fn select_title(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SelectTitleRequest>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(request_id = %request_id, title = %request.title, "Selecting title");
    dispatch(&state, request_id, SessionEvent::SelectTitle(request.title)).await
}

/// Resolves recommendations and posters for the selected movie
pub async fn show_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(request_id = %request_id, "Showing recommendations");

    let source = state
        .session
        .read()
        .await
        .selected()
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("No movie selected".to_string()))?;

    // Poster lookups go over the network, so they run without the session lock
    let prepared = SessionState::prepare_recommendations(&state.context, &source).await;

    let mut session = state.session.write().await;
    if let Err(e) = session.apply_recommendations(&source, prepared) {
        tracing::warn!(request_id = %request_id, error = %e, "Recommendations rejected");
        return Err(e);
    }

    Ok(Json(session.render()))
}

/// Sets the favorite toggle of one recommendation card
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ToggleFavoriteRequest>,
) -> AppResult<Json<SessionView>> {
    dispatch(
        &state,
        request_id,
        SessionEvent::ToggleFavorite {
            candidate: request.candidate,
            checked: request.checked,
        },
    )
    .await
}

/// Saves the checked cards as favorites of the selected movie
pub async fn confirm_selections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(request_id = %request_id, "Confirming selections");
    dispatch(&state, request_id, SessionEvent::ConfirmSelections).await
}

/// All favorites, grouped by source movie
pub async fn list_favorites(State(state): State<AppState>) -> Json<FavoritesMap> {
    let session = state.session.read().await;
    Json(session.favorites().clone())
}

/// Removes a favorite wherever it first appears
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(title): Path<String>,
) -> AppResult<Json<SessionView>> {
    tracing::info!(request_id = %request_id, title = %title, "Removing favorite");
    dispatch(&state, request_id, SessionEvent::RemoveFavorite(title)).await
}
