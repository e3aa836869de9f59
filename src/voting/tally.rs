//! Cross-question aggregation: fan out over every option's shards, sum, and
//! mark the leading option(s) per question.

use crate::db::Database;
use crate::models::{OptionRef, Question, QuestionTally};
use crate::voting::shards;

// Per-question tallies for a story, derived from live shard sums. Pure reads;
// cached totals are untouched.
pub async fn story_tally(
    db: &Database,
    story_id: &str,
) -> Result<Vec<QuestionTally>, Box<dyn std::error::Error + Send + Sync>> {
    collect_tallies(db, story_id, false).await
}

// Same aggregation, but also persists each freshly computed total into the
// option's cached `votes` field.
pub async fn refresh_story_tally(
    db: &Database,
    story_id: &str,
) -> Result<Vec<QuestionTally>, Box<dyn std::error::Error + Send + Sync>> {
    collect_tallies(db, story_id, true).await
}

async fn collect_tallies(
    db: &Database,
    story_id: &str,
    write_cache: bool,
) -> Result<Vec<QuestionTally>, Box<dyn std::error::Error + Send + Sync>> {
    let questions = db.list_questions(story_id).await?;

    let mut tallies = Vec::with_capacity(questions.len());
    for question in questions {
        tallies.push(tally_question(db, story_id, &question, write_cache).await?);
    }

    Ok(tallies)
}

async fn tally_question(
    db: &Database,
    story_id: &str,
    question: &Question,
    write_cache: bool,
) -> Result<QuestionTally, Box<dyn std::error::Error + Send + Sync>> {
    let mut counted = Vec::with_capacity(question.options.len());
    for (index, option) in question.options.iter().enumerate() {
        let option_ref = OptionRef::new(story_id, &question.id, index);
        let votes = if write_cache {
            shards::refresh_cached_total(db, &option_ref).await?
        } else {
            shards::compute_total(db, &option_ref).await?
        };
        counted.push((option.text.clone(), votes));
    }

    Ok(QuestionTally::new(
        question.id.clone(),
        question.question.clone(),
        counted,
    ))
}
