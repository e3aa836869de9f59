use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    // Cached aggregate; the shards are authoritative
    pub votes: i64,
}

impl QuestionOption {
    pub fn new(text: String) -> Self {
        Self { text, votes: 0 }
    }
}

// Addresses one option's shard set across the counter operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRef {
    pub story_id: String,
    pub question_id: String,
    pub option_index: usize,
}

impl OptionRef {
    pub fn new(story_id: &str, question_id: &str, option_index: usize) -> Self {
        Self {
            story_id: story_id.to_string(),
            question_id: question_id.to_string(),
            option_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDetail {
    pub question_id: String,
    pub option_index: usize,
}

// Per-question results with per-option totals derived from the shards
#[derive(Debug, Clone, Serialize)]
pub struct QuestionTally {
    pub id: String,
    pub question: String,
    pub options: Vec<OptionTally>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    pub text: String,
    pub votes: i64,
    pub leading: bool,
}

impl QuestionTally {
    pub fn new(id: String, question: String, counted: Vec<(String, i64)>) -> Self {
        let max_votes = counted.iter().map(|(_, votes)| *votes).max().unwrap_or(0);
        let options = counted
            .into_iter()
            .map(|(text, votes)| OptionTally {
                text,
                votes,
                leading: votes == max_votes,
            })
            .collect();
        Self { id, question, options }
    }

    // Text of the first option tied for the lead, if any options exist
    pub fn leading_option(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.leading)
            .map(|option| option.text.as_str())
    }
}

// Structured output of the generated-text parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: Vec<String>,
}

// Persisted form of an edited story: flattened paragraphs plus a parallel
// list of section titles, stored at generated_story/content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub generated_title: String,
    pub generated_story: Vec<String>,
    pub section_titles: Vec<String>,
}

impl From<StoryDocument> for GeneratedStory {
    fn from(document: StoryDocument) -> Self {
        let section_titles = document
            .sections
            .iter()
            .map(|section| section.title.clone())
            .collect();
        let generated_story = document
            .sections
            .into_iter()
            .flat_map(|section| section.content)
            .filter(|paragraph| !paragraph.trim().is_empty())
            .collect();
        Self {
            generated_title: document.title,
            generated_story,
            section_titles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_marks_all_leaders_on_tie() {
        let tally = QuestionTally::new(
            "q1".to_string(),
            "Pick one".to_string(),
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 1),
                ("c".to_string(), 3),
            ],
        );
        let leading: Vec<&str> = tally
            .options
            .iter()
            .filter(|option| option.leading)
            .map(|option| option.text.as_str())
            .collect();
        assert_eq!(leading, vec!["a", "c"]);
        assert_eq!(tally.leading_option(), Some("a"));
    }

    #[test]
    fn tally_with_no_votes_leads_everywhere() {
        let tally = QuestionTally::new(
            "q1".to_string(),
            "Pick one".to_string(),
            vec![("a".to_string(), 0), ("b".to_string(), 0)],
        );
        assert!(tally.options.iter().all(|option| option.leading));
    }

    #[test]
    fn flattening_drops_empty_paragraphs_and_keeps_section_titles() {
        let document = StoryDocument {
            title: "T".to_string(),
            sections: vec![
                Section {
                    title: "A".to_string(),
                    content: vec!["p1".to_string(), "   ".to_string()],
                },
                Section {
                    title: "B".to_string(),
                    content: vec!["p2".to_string()],
                },
            ],
        };
        let story = GeneratedStory::from(document);
        assert_eq!(story.generated_title, "T");
        assert_eq!(story.generated_story, vec!["p1", "p2"]);
        assert_eq!(story.section_titles, vec!["A", "B"]);
    }

    #[test]
    fn generated_story_serializes_with_camel_case_fields() {
        let story = GeneratedStory {
            generated_title: "T".to_string(),
            generated_story: vec!["p".to_string()],
            section_titles: vec!["A".to_string()],
        };
        let value = serde_json::to_value(&story).unwrap();
        assert!(value.get("generatedTitle").is_some());
        assert!(value.get("generatedStory").is_some());
        assert!(value.get("sectionTitles").is_some());
    }
}
