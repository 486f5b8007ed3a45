use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Catalog, InteractionKind, TrackedInteraction, TransactionRecord};
use crate::services::{flush_session, present_recommendations, RecommendationPage, SynthesisOutput, Synthesizer};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ShownItemsRequest {
    pub user_id: String,
    pub items: Vec<(String, f64)>,
}

#[derive(Debug, Serialize)]
pub struct ShownItemsResponse {
    pub current_items: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub ranked: Vec<(String, f64)>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub user_id: String,
    pub artwork_id: String,
    pub interaction_type: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub interaction_type: InteractionKind,
    /// Set for likes only: whether the transaction reached the sink
    pub transaction_recorded: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    pub inserted: usize,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct SynthesisRequest {
    pub likes: Vec<Value>,
    pub catalog: Option<Vec<String>>,
    pub seed: Option<u64>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Open a new tracking session
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.create_session().await;
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// Drop a session and everything it tracked
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.remove_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a displayed list of items
pub async fn track_shown(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ShownItemsRequest>,
) -> AppResult<Json<ShownItemsResponse>> {
    let session = state.session(session_id).await?;
    let mut tracker = session.lock().await;
    tracker.track_shown_items(&request.user_id, &request.items);
    Ok(Json(ShownItemsResponse {
        current_items: tracker.get_current_items(&request.user_id),
    }))
}

/// Build the recommendation page for a model ranking
pub async fn recommend(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationPage>> {
    let page_size = request.page_size.unwrap_or(state.config.page_size);
    if page_size == 0 {
        return Err(AppError::InvalidInput("page_size must be greater than zero".to_string()));
    }

    let session = state.session(session_id).await?;
    let mut tracker = session.lock().await;
    let page = present_recommendations(&mut tracker, &request.user_id, &request.ranked, page_size);
    Ok(Json(page))
}

/// Record a click, like or ignore
///
/// A like is also written to the transactions table; a failed transaction insert
/// is reported in the response but does not undo the tracked like.
pub async fn track(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<TrackRequest>,
) -> AppResult<Json<TrackResponse>> {
    let kind = request.interaction_type.parse::<InteractionKind>()?;
    let session = state.session(session_id).await?;

    {
        let mut tracker = session.lock().await;
        tracker.track_at(&request.user_id, &request.artwork_id, kind, Utc::now().timestamp());
    }

    let transaction_recorded = if kind == InteractionKind::Like {
        let record = TransactionRecord::from_like(&request.user_id, &request.artwork_id, Utc::now());
        match state.sink.insert_transaction(&record).await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %request.user_id,
                    artwork_id = %request.artwork_id,
                    "Failed to record transaction, but like was tracked"
                );
                Some(false)
            }
        }
    } else {
        None
    };

    Ok(Json(TrackResponse {
        interaction_type: kind,
        transaction_recorded,
    }))
}

/// All tracked interactions of a session in first-seen order
pub async fn get_interactions(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Vec<TrackedInteraction>>> {
    let session = state.session(session_id).await?;
    let tracker = session.lock().await;
    Ok(Json(tracker.get_interactions_data()))
}

/// Push tracked interactions to the sink and clear them
pub async fn flush(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<FlushResponse>> {
    let session = state.session(session_id).await?;
    let mut tracker = session.lock().await;
    let inserted = flush_session(&mut tracker, state.sink.as_ref()).await?;
    Ok(Json(FlushResponse { inserted }))
}

/// Clear tracked interactions, keeping liked state
pub async fn clear(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let session = state.session(session_id).await?;
    session.lock().await.clear_interactions();
    Ok(StatusCode::NO_CONTENT)
}

/// Items last shown to a user
pub async fn current_items(
    State(state): State<AppState>,
    Path((session_id, user_id)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<String>>> {
    let session = state.session(session_id).await?;
    let tracker = session.lock().await;
    Ok(Json(tracker.get_current_items(&user_id)))
}

/// Whether an item may still be shown to a user
pub async fn item_visibility(
    State(state): State<AppState>,
    Path((session_id, user_id, item_id)): Path<(Uuid, String, String)>,
) -> AppResult<Json<VisibilityResponse>> {
    let session = state.session(session_id).await?;
    let tracker = session.lock().await;
    Ok(Json(VisibilityResponse {
        visible: tracker.should_show_item(&user_id, &item_id),
    }))
}

/// Synthesize an interaction history from confirmed likes
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesisRequest>,
) -> AppResult<Json<SynthesisOutput>> {
    let seed = request.seed.or(state.config.synthesis_seed);
    let chunk_size = state.config.synthesis_chunk_size;

    let output = tokio::task::spawn_blocking(move || {
        let mut synthesizer = Synthesizer::default().with_chunk_size(chunk_size);
        if let Some(seed) = seed {
            synthesizer = synthesizer.with_seed(seed);
        }
        synthesizer.synthesize_rows(&request.likes, request.catalog.map(Catalog::new))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(output))
}
