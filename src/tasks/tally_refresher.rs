use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::time::interval;

use crate::db::Database;
use crate::voting::tally;

// Periodically re-derives every option's total from its shards and persists
// it into the cached `votes` field, so cached numbers never drift far from
// the authoritative shard sums.
pub async fn refresh_tallies_task(database: Arc<Database>, refresh_secs: u64) {
    info!("Starting background task to refresh cached vote totals...");
    let mut interval = interval(Duration::from_secs(refresh_secs));

    loop {
        interval.tick().await;

        let stories = match database.list_stories().await {
            Ok(stories) => stories,
            Err(e) => {
                error!("Failed to list stories for tally refresh: {e}");
                continue;
            }
        };

        for story in stories {
            if let Err(e) = tally::refresh_story_tally(&database, &story.id).await {
                error!("Failed to refresh tallies for story {}: {e}", story.id);
            }
        }
    }
}
