//! Canonical collection paths for every document kind. These shapes are part
//! of the store's observable contract and must not drift between writers and
//! readers.

use crate::models::OptionRef;

pub const STORIES: &str = "stories";
pub const GENERATED_DOC_ID: &str = "content";

pub fn questions(story_id: &str) -> String {
    format!("stories/{story_id}/questions")
}

pub fn shards(option: &OptionRef) -> String {
    format!(
        "stories/{}/questions/{}/options/{}/shards",
        option.story_id, option.question_id, option.option_index
    )
}

pub fn shard_id(index: u32) -> String {
    format!("shard_{index}")
}

pub fn voters(story_id: &str) -> String {
    format!("stories/{story_id}/votersDetails")
}

pub fn vote_details(story_id: &str, user_id: &str) -> String {
    format!("stories/{story_id}/votersDetails/{user_id}/voteDetails")
}

pub fn generated_story(story_id: &str) -> String {
    format!("stories/{story_id}/generated_story")
}

// Prefix covering every document stored beneath a story
pub fn story_subtree(story_id: &str) -> String {
    format!("stories/{story_id}/")
}

// Prefix covering a question's options and their shards
pub fn question_subtree(story_id: &str, question_id: &str) -> String {
    format!("stories/{story_id}/questions/{question_id}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_shapes_match_the_store_contract() {
        let option = OptionRef::new("s1", "q1", 2);
        assert_eq!(questions("s1"), "stories/s1/questions");
        assert_eq!(shards(&option), "stories/s1/questions/q1/options/2/shards");
        assert_eq!(shard_id(7), "shard_7");
        assert_eq!(voters("s1"), "stories/s1/votersDetails");
        assert_eq!(vote_details("s1", "u1"), "stories/s1/votersDetails/u1/voteDetails");
        assert_eq!(generated_story("s1"), "stories/s1/generated_story");
        assert_eq!(generated_story("s1") + "/" + GENERATED_DOC_ID, "stories/s1/generated_story/content");
    }

    #[test]
    fn subtree_prefixes_cover_nested_collections() {
        let option = OptionRef::new("s1", "q1", 0);
        assert!(shards(&option).starts_with(&question_subtree("s1", "q1")));
        assert!(vote_details("s1", "u1").starts_with(&story_subtree("s1")));
        assert!(generated_story("s1").starts_with(&story_subtree("s1")));
    }
}
