pub mod shards;
pub mod tally;

use std::collections::HashMap;

use log::warn;
use thiserror::Error;

use crate::db::Database;
use crate::models::OptionRef;

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("user has already voted in this story")]
    AlreadyVoted,
    #[error("story {0} not found")]
    StoryNotFound(String),
    #[error("question {0} not found in this story")]
    UnknownQuestion(String),
    #[error("option index {index} out of range for question {question_id}")]
    InvalidOption { question_id: String, index: usize },
    #[error("storage error: {0}")]
    Store(#[from] Box<dyn std::error::Error + Send + Sync>),
}

// Casts a full ballot: one chosen option index per question id. The voter
// record is the sole repeat-voting gate; once it exists no further increments
// are attempted for this user. Writes after the record is created are not
// rolled back on failure.
pub async fn cast_votes(
    db: &Database,
    shard_count: u32,
    story_id: &str,
    user_id: &str,
    selections: &HashMap<String, usize>,
) -> Result<(), VoteError> {
    if db.get_story(story_id).await?.is_none() {
        return Err(VoteError::StoryNotFound(story_id.to_string()));
    }

    // Validate the whole ballot before burning the one voter record
    for (question_id, &option_index) in selections {
        let question = db
            .get_question(story_id, question_id)
            .await?
            .ok_or_else(|| VoteError::UnknownQuestion(question_id.clone()))?;
        if option_index >= question.options.len() {
            return Err(VoteError::InvalidOption {
                question_id: question_id.clone(),
                index: option_index,
            });
        }
    }

    if !db.record_voter(story_id, user_id).await? {
        return Err(VoteError::AlreadyVoted);
    }

    for (question_id, &option_index) in selections {
        let option = OptionRef::new(story_id, question_id, option_index);
        shards::increment_vote(db, &option, shard_count).await?;
        if !db
            .put_vote_detail(story_id, user_id, question_id, option_index)
            .await?
        {
            warn!("vote detail for question {question_id} already present for user {user_id}");
        }
    }

    Ok(())
}
