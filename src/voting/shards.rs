//! Sharded vote counter. Each option owns a fixed set of independent shard
//! counters; writes pick one shard at random to spread contention, reads sum
//! every shard. The sum is eventually consistent, never decreasing.

use rand::Rng;
use serde_json::json;

use crate::db::{Database, paths};
use crate::models::OptionRef;

// Creates shard_0 .. shard_{N-1}, each zeroed. Called once per option at
// creation time. Re-running resets existing shards to zero, so callers must
// not invoke it on an option that has already received votes.
pub async fn init_shards(
    db: &Database,
    option: &OptionRef,
    shard_count: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let collection = paths::shards(option);
    for index in 0..shard_count {
        db.put_document(&collection, &paths::shard_id(index), &json!({ "votes": 0 }))
            .await?;
    }

    Ok(())
}

// Applies an atomic +1 to one uniformly chosen shard. Fire-and-forget: no
// verification read, and an uninitialized shard surfaces as an error.
pub async fn increment_vote(
    db: &Database,
    option: &OptionRef,
    shard_count: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let shard = rand::thread_rng().gen_range(0..shard_count);
    db.increment_field(&paths::shards(option), &paths::shard_id(shard), "votes", 1)
        .await
}

// Point-in-time sum over every shard document of the option. Pure read: no
// snapshot across shards, no cache write. Missing shards contribute nothing,
// so a fully deleted shard set totals zero.
pub async fn compute_total(
    db: &Database,
    option: &OptionRef,
) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
    let shards = db.list_documents(&paths::shards(option)).await?;

    Ok(shards
        .iter()
        .map(|(_, data)| data["votes"].as_i64().unwrap_or(0))
        .sum())
}

// Computes the total and writes it back into the option's cached `votes`
// field. The cache write is opt-in; readers that only need the number call
// compute_total instead.
pub async fn refresh_cached_total(
    db: &Database,
    option: &OptionRef,
) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
    let total = compute_total(db, option).await?;
    db.set_option_votes(&option.story_id, &option.question_id, option.option_index, total)
        .await?;

    Ok(total)
}

// Deletes all shard records of an option. Not transactional with the option
// removal itself; a partial failure can leave orphan shards behind.
pub async fn delete_shards(
    db: &Database,
    option: &OptionRef,
    shard_count: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let collection = paths::shards(option);
    for index in 0..shard_count {
        db.delete_document(&collection, &paths::shard_id(index)).await?;
    }

    Ok(())
}
