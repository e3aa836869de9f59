use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use log::info;

use crate::error::AppError;
use crate::models::{GeneratedStory, StoryDocument};
use crate::state::AppState;
use crate::story;

// Runs the full generation pass and returns the parsed document for editing.
// Nothing is persisted until the edited version is submitted.
pub async fn generate(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<StoryDocument>, AppError> {
    let document = story::generate_story(&state.db, state.generator.as_ref(), &story_id).await?;
    info!(
        "Generated story draft for {} ({} sections)",
        story_id,
        document.sections.len()
    );

    Ok(Json(document))
}

pub async fn get_generated(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<GeneratedStory>, AppError> {
    let generated = state
        .db
        .get_generated_story(&story_id)
        .await?
        .ok_or(AppError::NotFound("generated story"))?;

    Ok(Json(generated))
}

// Persists the edited story: empty paragraphs are dropped, the title is
// required, and the section-title list rides along unchanged
pub async fn put_generated(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Json(mut edited): Json<GeneratedStory>,
) -> Result<StatusCode, AppError> {
    if edited.generated_title.trim().is_empty() {
        return Err(AppError::BadRequest("The story title cannot be empty.".to_string()));
    }
    if state.db.get_story(&story_id).await?.is_none() {
        return Err(AppError::NotFound("story"));
    }

    edited
        .generated_story
        .retain(|paragraph| !paragraph.trim().is_empty());

    state.db.save_generated_story(&story_id, &edited).await?;
    info!("Saved generated story content for {story_id}");

    Ok(StatusCode::NO_CONTENT)
}
