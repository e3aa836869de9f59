use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Question, QuestionTally, Story};
use crate::state::AppState;
use crate::voting;

#[derive(Serialize)]
pub struct BallotResponse {
    story: Story,
    questions: Vec<Question>,
    has_voted: bool,
}

// Everything a voter needs to render the poll, plus whether their voter
// record already exists
pub async fn ballot(
    State(state): State<AppState>,
    Path((story_id, user_id)): Path<(String, String)>,
) -> Result<Json<BallotResponse>, AppError> {
    let story = state
        .db
        .get_story(&story_id)
        .await?
        .ok_or(AppError::NotFound("story"))?;

    let questions = state.db.list_questions(&story_id).await?;
    let has_voted = state.db.voter_exists(&story_id, &user_id).await?;

    Ok(Json(BallotResponse {
        story,
        questions,
        has_voted,
    }))
}

#[derive(Deserialize)]
pub struct CastVotesRequest {
    user_id: String,
    // question id -> chosen option index
    selections: HashMap<String, usize>,
}

pub async fn cast(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Json(request): Json<CastVotesRequest>,
) -> Result<StatusCode, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("A user id is required.".to_string()));
    }
    if request.selections.is_empty() {
        return Err(AppError::BadRequest("A ballot cannot be empty.".to_string()));
    }

    voting::cast_votes(
        &state.db,
        state.config.shard_count,
        &story_id,
        &request.user_id,
        &request.selections,
    )
    .await?;

    info!(
        "Recorded ballot for user {} in story {} ({} selections)",
        request.user_id,
        story_id,
        request.selections.len()
    );

    Ok(StatusCode::CREATED)
}

#[derive(Deserialize)]
pub struct ResultsQuery {
    // Opt-in: also persist the freshly computed totals into the cached
    // `votes` fields
    #[serde(default)]
    refresh: bool,
}

pub async fn results(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<QuestionTally>>, AppError> {
    if state.db.get_story(&story_id).await?.is_none() {
        return Err(AppError::NotFound("story"));
    }

    let tallies = if query.refresh {
        voting::tally::refresh_story_tally(&state.db, &story_id).await?
    } else {
        voting::tally::story_tally(&state.db, &story_id).await?
    };

    Ok(Json(tallies))
}
