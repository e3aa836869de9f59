pub mod story;
pub mod vote;

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, header::CONTENT_TYPE};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::AppError;
use crate::models::{OptionRef, Question, QuestionOption, Story};
use crate::state::AppState;
use crate::voting::shards;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/stories", post(create_story).get(list_stories))
        .route("/stories/:story_id", get(get_story).delete(delete_story))
        .route(
            "/stories/:story_id/questions",
            post(add_question).get(list_questions),
        )
        .route(
            "/stories/:story_id/questions/:question_id",
            axum::routing::put(update_question).delete(delete_question),
        )
        .route(
            "/stories/:story_id/questions/:question_id/options",
            post(add_option),
        )
        .route(
            "/stories/:story_id/questions/:question_id/options/:index",
            delete(remove_option),
        )
        .route("/stories/:story_id/ballot/:user_id", get(vote::ballot))
        .route("/stories/:story_id/votes", post(vote::cast))
        .route("/stories/:story_id/results", get(vote::results))
        .route("/stories/:story_id/generate", post(story::generate))
        .route(
            "/stories/:story_id/generated",
            get(story::get_generated).put(story::put_generated),
        )
        .layer(cors)
        .with_state(state)
}

// --- Stories ---

#[derive(Deserialize)]
pub struct CreateStoryRequest {
    title: String,
    description: String,
}

async fn create_story(
    State(state): State<AppState>,
    Json(request): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<Story>), AppError> {
    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Please provide a title and description.".to_string(),
        ));
    }

    let story = state
        .db
        .create_story(request.title.trim(), request.description.trim())
        .await?;
    info!("Created story {}", story.id);

    Ok((StatusCode::CREATED, Json(story)))
}

async fn list_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, AppError> {
    Ok(Json(state.db.list_stories().await?))
}

async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<Story>, AppError> {
    let story = state
        .db
        .get_story(&story_id)
        .await?
        .ok_or(AppError::NotFound("story"))?;

    Ok(Json(story))
}

async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.db.get_story(&story_id).await?.is_none() {
        return Err(AppError::NotFound("story"));
    }

    state.db.delete_story(&story_id).await?;
    info!("Deleted story {story_id} and its subtree");

    Ok(StatusCode::NO_CONTENT)
}

// --- Questions ---

#[derive(Deserialize)]
pub struct AddQuestionRequest {
    question: String,
    options: Vec<String>,
}

async fn add_question(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Json(request): Json<AddQuestionRequest>,
) -> Result<(StatusCode, Json<Question>), AppError> {
    if state.db.get_story(&story_id).await?.is_none() {
        return Err(AppError::NotFound("story"));
    }

    let options: Vec<QuestionOption> = request
        .options
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(|text| QuestionOption::new(text.to_string()))
        .collect();

    if request.question.trim().is_empty() || options.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide a question and valid options.".to_string(),
        ));
    }

    let question = state
        .db
        .add_question(&story_id, request.question.trim(), options)
        .await?;

    // Every option gets its shard set up front
    for index in 0..question.options.len() {
        let option = OptionRef::new(&story_id, &question.id, index);
        shards::init_shards(&state.db, &option, state.config.shard_count).await?;
    }

    Ok((StatusCode::CREATED, Json(question)))
}

async fn list_questions(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<Vec<Question>>, AppError> {
    if state.db.get_story(&story_id).await?.is_none() {
        return Err(AppError::NotFound("story"));
    }

    Ok(Json(state.db.list_questions(&story_id).await?))
}

#[derive(Deserialize)]
pub struct UpdateQuestionRequest {
    question: String,
    options: Vec<String>,
}

// Rewords the question and its option texts in place. Option counts are
// managed through the dedicated option endpoints so the shard sets stay in
// step with the option list.
async fn update_question(
    State(state): State<AppState>,
    Path((story_id, question_id)): Path<(String, String)>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, AppError> {
    let mut question = state
        .db
        .get_question(&story_id, &question_id)
        .await?
        .ok_or(AppError::NotFound("question"))?;

    if request.question.trim().is_empty()
        || request.options.iter().any(|text| text.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "Please provide a question and valid options.".to_string(),
        ));
    }
    if request.options.len() != question.options.len() {
        return Err(AppError::BadRequest(
            "Option count cannot change here; use the option endpoints.".to_string(),
        ));
    }

    question.question = request.question.trim().to_string();
    for (option, text) in question.options.iter_mut().zip(&request.options) {
        option.text = text.trim().to_string();
    }

    state.db.update_question(&story_id, &question).await?;

    Ok(Json(question))
}

async fn delete_question(
    State(state): State<AppState>,
    Path((story_id, question_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    if state.db.get_question(&story_id, &question_id).await?.is_none() {
        return Err(AppError::NotFound("question"));
    }

    state.db.delete_question(&story_id, &question_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AddOptionRequest {
    text: String,
}

#[derive(Serialize)]
pub struct AddOptionResponse {
    index: usize,
}

async fn add_option(
    State(state): State<AppState>,
    Path((story_id, question_id)): Path<(String, String)>,
    Json(request): Json<AddOptionRequest>,
) -> Result<(StatusCode, Json<AddOptionResponse>), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Option text cannot be empty.".to_string()));
    }
    if state.db.get_question(&story_id, &question_id).await?.is_none() {
        return Err(AppError::NotFound("question"));
    }

    let index = state
        .db
        .push_option(&story_id, &question_id, request.text.trim())
        .await?;

    let option = OptionRef::new(&story_id, &question_id, index);
    shards::init_shards(&state.db, &option, state.config.shard_count).await?;

    Ok((StatusCode::CREATED, Json(AddOptionResponse { index })))
}

// Removes the option, then its shards. The two steps are not transactional;
// a failure in between leaves orphan shard records behind.
async fn remove_option(
    State(state): State<AppState>,
    Path((story_id, question_id, index)): Path<(String, String, usize)>,
) -> Result<StatusCode, AppError> {
    let question = state
        .db
        .get_question(&story_id, &question_id)
        .await?
        .ok_or(AppError::NotFound("question"))?;
    if index >= question.options.len() {
        return Err(AppError::NotFound("option"));
    }

    state.db.remove_option(&story_id, &question_id, index).await?;

    let option = OptionRef::new(&story_id, &question_id, index);
    shards::delete_shards(&state.db, &option, state.config.shard_count).await?;

    Ok(StatusCode::NO_CONTENT)
}
