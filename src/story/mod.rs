pub mod client;
pub mod parser;
pub mod prompt;

use thiserror::Error;

use crate::db::Database;
use crate::models::StoryDocument;
use client::{GenerateError, TextGenerator};
use parser::ParseError;
use prompt::COMPLETION_DELIMITER;

// Shown to end users whenever the generation pipeline fails; the underlying
// error is only logged
pub const GENERATION_FALLBACK: &str = "An error occurred. Please try again.";

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("story {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Generation(#[from] GenerateError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("storage error: {0}")]
    Store(#[from] Box<dyn std::error::Error + Send + Sync>),
}

// The completion is the segment between the first delimiter (which closes the
// prompt) and any later one. Without a delimiter the whole text is used.
pub fn extract_completion(generated: &str) -> &str {
    generated
        .split(COMPLETION_DELIMITER)
        .nth(1)
        .unwrap_or(generated)
}

// Full generation pass: tally the story's questions, prompt the endpoint with
// the winning options, and parse the completion into a structured document.
// The result is returned for editing; persisting it is a separate operation.
pub async fn generate_story(
    db: &Database,
    generator: &dyn TextGenerator,
    story_id: &str,
) -> Result<StoryDocument, StoryError> {
    let story = db
        .get_story(story_id)
        .await?
        .ok_or_else(|| StoryError::NotFound(story_id.to_string()))?;

    let tallies = crate::voting::tally::story_tally(db, story_id).await?;
    let prompt = prompt::build_prompt(&story, &tallies);

    let generated = generator.generate(&prompt).await?;
    let document = parser::parse(extract_completion(&generated))?;

    Ok(document)
}
