use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::{
    Row, Sqlite,
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use uuid::Uuid;

use crate::models::{GeneratedStory, Question, QuestionOption, Story, VoteDetail};

pub mod paths;

// Lightweight document store over SQLite: documents live under a collection
// path and carry a JSON body. Collection paths follow the shapes in `paths`.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Self {
        // A single connection keeps every test statement on the same
        // in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database");
        Self::init_schema(&pool).await.expect("failed to init schema");
        Self { pool }
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // --- Generic document operations ---

    // Overwrite semantics; keeps the existing rowid so listing order is stable
    pub async fn put_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES (?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(data.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Insert under a fresh random id and return it
    pub async fn add_document(
        &self,
        collection: &str,
        data: &Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(data.to_string())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    // Insert-if-absent; returns false when the document already existed
    pub async fn insert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO documents (collection, id, data)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(data.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query(
            r#"
            SELECT data FROM documents WHERE collection = ? AND id = ?
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let data: Value = serde_json::from_str(&row.get::<String, _>("data"))?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    pub async fn document_exists(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query("SELECT 1 FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    // Documents of one collection in insertion order
    pub async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Value)>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query(
            r#"
            SELECT id, data FROM documents WHERE collection = ? ORDER BY rowid
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let data: Value = serde_json::from_str(&row.get::<String, _>("data"))?;
            documents.push((row.get::<String, _>("id"), data));
        }

        Ok(documents)
    }

    pub async fn delete_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Remove every document whose collection path starts with the prefix
    pub async fn delete_prefixed(
        &self,
        prefix: &str,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query("DELETE FROM documents WHERE collection LIKE ? || '%'")
            .bind(prefix)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // Atomic in-place increment of a numeric field. Errors when the document
    // does not exist rather than creating it.
    pub async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = json_set(data, '$.' || ?, COALESCE(json_extract(data, '$.' || ?), 0) + ?)
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(field)
        .bind(field)
        .bind(delta)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("document {collection}/{id} does not exist").into());
        }

        Ok(())
    }

    // --- Stories ---

    pub async fn create_story(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Story, Box<dyn std::error::Error + Send + Sync>> {
        let created_at = Utc::now();
        let data = json!({
            "title": title,
            "description": description,
            "createdAt": created_at.to_rfc3339(),
        });
        let id = self.add_document(paths::STORIES, &data).await?;

        Ok(Story {
            id,
            title: title.to_string(),
            description: description.to_string(),
            created_at,
        })
    }

    pub async fn get_story(
        &self,
        story_id: &str,
    ) -> Result<Option<Story>, Box<dyn std::error::Error + Send + Sync>> {
        match self.get_document(paths::STORIES, story_id).await? {
            Some(data) => Ok(Some(story_from_value(story_id, &data)?)),
            None => Ok(None),
        }
    }

    pub async fn list_stories(&self) -> Result<Vec<Story>, Box<dyn std::error::Error + Send + Sync>> {
        let documents = self.list_documents(paths::STORIES).await?;

        let mut stories = Vec::with_capacity(documents.len());
        for (id, data) in documents {
            stories.push(story_from_value(&id, &data)?);
        }

        Ok(stories)
    }

    // Removes the story document and everything stored beneath it: questions,
    // shards, voter records, vote details, and generated content
    pub async fn delete_story(
        &self,
        story_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.delete_document(paths::STORIES, story_id).await?;
        self.delete_prefixed(&paths::story_subtree(story_id)).await?;

        Ok(())
    }

    // --- Questions ---

    pub async fn add_question(
        &self,
        story_id: &str,
        question: &str,
        options: Vec<QuestionOption>,
    ) -> Result<Question, Box<dyn std::error::Error + Send + Sync>> {
        let data = json!({
            "question": question,
            "options": &options,
        });
        let id = self.add_document(&paths::questions(story_id), &data).await?;

        Ok(Question {
            id,
            question: question.to_string(),
            options,
        })
    }

    pub async fn get_question(
        &self,
        story_id: &str,
        question_id: &str,
    ) -> Result<Option<Question>, Box<dyn std::error::Error + Send + Sync>> {
        match self.get_document(&paths::questions(story_id), question_id).await? {
            Some(data) => Ok(Some(question_from_value(question_id, &data)?)),
            None => Ok(None),
        }
    }

    pub async fn list_questions(
        &self,
        story_id: &str,
    ) -> Result<Vec<Question>, Box<dyn std::error::Error + Send + Sync>> {
        let documents = self.list_documents(&paths::questions(story_id)).await?;

        let mut questions = Vec::with_capacity(documents.len());
        for (id, data) in documents {
            questions.push(question_from_value(&id, &data)?);
        }

        Ok(questions)
    }

    pub async fn update_question(
        &self,
        story_id: &str,
        question: &Question,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = json!({
            "question": &question.question,
            "options": &question.options,
        });
        self.put_document(&paths::questions(story_id), &question.id, &data)
            .await
    }

    pub async fn delete_question(
        &self,
        story_id: &str,
        question_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.delete_document(&paths::questions(story_id), question_id)
            .await?;
        self.delete_prefixed(&paths::question_subtree(story_id, question_id))
            .await?;

        Ok(())
    }

    // Appends an option with a zeroed cached total; returns its index
    pub async fn push_option(
        &self,
        story_id: &str,
        question_id: &str,
        text: &str,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut question = self
            .get_question(story_id, question_id)
            .await?
            .ok_or_else(|| format!("question {question_id} not found"))?;

        question.options.push(QuestionOption::new(text.to_string()));
        self.update_question(story_id, &question).await?;

        Ok(question.options.len() - 1)
    }

    pub async fn remove_option(
        &self,
        story_id: &str,
        question_id: &str,
        index: usize,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut question = self
            .get_question(story_id, question_id)
            .await?
            .ok_or_else(|| format!("question {question_id} not found"))?;

        if index >= question.options.len() {
            return Err(format!("option index {index} out of range").into());
        }

        question.options.remove(index);
        self.update_question(story_id, &question).await
    }

    // Cache write used by the aggregation refresh; the shards stay authoritative
    pub async fn set_option_votes(
        &self,
        story_id: &str,
        question_id: &str,
        index: usize,
        votes: i64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut question = self
            .get_question(story_id, question_id)
            .await?
            .ok_or_else(|| format!("question {question_id} not found"))?;

        let option = question
            .options
            .get_mut(index)
            .ok_or_else(|| format!("option index {index} out of range"))?;
        option.votes = votes;

        self.update_question(story_id, &question).await
    }

    // --- Voter records and vote details ---

    pub async fn voter_exists(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.document_exists(&paths::voters(story_id), user_id).await
    }

    // At-most-once voter record; false means the user already voted
    pub async fn record_voter(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let data = json!({ "userId": user_id });
        self.insert_document(&paths::voters(story_id), user_id, &data)
            .await
    }

    // Write-once; false means a detail for this question was already recorded
    pub async fn put_vote_detail(
        &self,
        story_id: &str,
        user_id: &str,
        question_id: &str,
        option_index: usize,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let data = json!({
            "questionId": question_id,
            "optionIndex": option_index,
        });
        self.insert_document(&paths::vote_details(story_id, user_id), question_id, &data)
            .await
    }

    pub async fn list_vote_details(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Result<Vec<VoteDetail>, Box<dyn std::error::Error + Send + Sync>> {
        let documents = self
            .list_documents(&paths::vote_details(story_id, user_id))
            .await?;

        let mut details = Vec::with_capacity(documents.len());
        for (_, data) in documents {
            details.push(serde_json::from_value(data)?);
        }

        Ok(details)
    }

    // --- Generated story ---

    pub async fn save_generated_story(
        &self,
        story_id: &str,
        story: &GeneratedStory,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = serde_json::to_value(story)?;
        self.put_document(&paths::generated_story(story_id), paths::GENERATED_DOC_ID, &data)
            .await
    }

    pub async fn get_generated_story(
        &self,
        story_id: &str,
    ) -> Result<Option<GeneratedStory>, Box<dyn std::error::Error + Send + Sync>> {
        match self
            .get_document(&paths::generated_story(story_id), paths::GENERATED_DOC_ID)
            .await?
        {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }
}

fn story_from_value(
    id: &str,
    data: &Value,
) -> Result<Story, Box<dyn std::error::Error + Send + Sync>> {
    let created_at_str = data["createdAt"]
        .as_str()
        .ok_or_else(|| format!("story {id} is missing createdAt"))?;
    let created_at = DateTime::parse_from_rfc3339(created_at_str)
        .map_err(|e| format!("failed to parse createdAt for story {id}: {e}"))?
        .with_timezone(&Utc);

    Ok(Story {
        id: id.to_string(),
        title: data["title"].as_str().unwrap_or_default().to_string(),
        description: data["description"].as_str().unwrap_or_default().to_string(),
        created_at,
    })
}

fn question_from_value(
    id: &str,
    data: &Value,
) -> Result<Question, Box<dyn std::error::Error + Send + Sync>> {
    let options: Vec<QuestionOption> = serde_json::from_value(data["options"].clone())
        .map_err(|e| format!("failed to parse options for question {id}: {e}"))?;

    Ok(Question {
        id: id.to_string(),
        question: data["question"].as_str().unwrap_or_default().to_string(),
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionRef;

    #[tokio::test]
    async fn documents_roundtrip_and_list_in_insertion_order() {
        let db = Database::open_in_memory().await;

        db.put_document("c", "b", &json!({ "n": 2 })).await.unwrap();
        db.put_document("c", "a", &json!({ "n": 1 })).await.unwrap();
        // Overwriting must not move the document to the end of the listing
        db.put_document("c", "b", &json!({ "n": 3 })).await.unwrap();

        let documents = db.list_documents("c").await.unwrap();
        let ids: Vec<&str> = documents.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(documents[0].1["n"], 3);

        assert_eq!(db.get_document("c", "a").await.unwrap().unwrap()["n"], 1);
        assert!(db.get_document("c", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_document_is_write_once() {
        let db = Database::open_in_memory().await;

        assert!(db.insert_document("c", "x", &json!({ "v": 1 })).await.unwrap());
        assert!(!db.insert_document("c", "x", &json!({ "v": 2 })).await.unwrap());

        // The losing insert must not clobber the original
        assert_eq!(db.get_document("c", "x").await.unwrap().unwrap()["v"], 1);
    }

    #[tokio::test]
    async fn increment_field_requires_an_existing_document() {
        let db = Database::open_in_memory().await;

        db.put_document("c", "x", &json!({ "votes": 0 })).await.unwrap();
        db.increment_field("c", "x", "votes", 1).await.unwrap();
        db.increment_field("c", "x", "votes", 1).await.unwrap();
        assert_eq!(db.get_document("c", "x").await.unwrap().unwrap()["votes"], 2);

        assert!(db.increment_field("c", "missing", "votes", 1).await.is_err());
    }

    #[tokio::test]
    async fn delete_prefixed_spares_siblings() {
        let db = Database::open_in_memory().await;

        db.put_document("stories/s1/questions", "q1", &json!({})).await.unwrap();
        db.put_document("stories/s1/votersDetails", "u1", &json!({})).await.unwrap();
        db.put_document("stories/s2/questions", "q1", &json!({})).await.unwrap();

        db.delete_prefixed("stories/s1/").await.unwrap();

        assert!(db.get_document("stories/s1/questions", "q1").await.unwrap().is_none());
        assert!(db.get_document("stories/s2/questions", "q1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn story_crud_roundtrip() {
        let db = Database::open_in_memory().await;

        let story = db.create_story("Campus 2030", "A day on campus").await.unwrap();
        let fetched = db.get_story(&story.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Campus 2030");
        assert_eq!(fetched.description, "A day on campus");

        let question = db
            .add_question(&story.id, "Theme?", vec![QuestionOption::new("a".to_string())])
            .await
            .unwrap();
        let option = OptionRef::new(&story.id, &question.id, 0);
        db.put_document(&paths::shards(&option), &paths::shard_id(0), &json!({ "votes": 4 }))
            .await
            .unwrap();

        db.delete_story(&story.id).await.unwrap();
        assert!(db.get_story(&story.id).await.unwrap().is_none());
        assert!(db.list_questions(&story.id).await.unwrap().is_empty());
        assert!(db.list_documents(&paths::shards(&option)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn option_edits_preserve_cached_votes() {
        let db = Database::open_in_memory().await;

        let story = db.create_story("t", "d").await.unwrap();
        let question = db
            .add_question(
                &story.id,
                "Theme?",
                vec![QuestionOption::new("a".to_string()), QuestionOption::new("b".to_string())],
            )
            .await
            .unwrap();

        db.set_option_votes(&story.id, &question.id, 1, 7).await.unwrap();
        let index = db.push_option(&story.id, &question.id, "c").await.unwrap();
        assert_eq!(index, 2);

        let fetched = db.get_question(&story.id, &question.id).await.unwrap().unwrap();
        assert_eq!(fetched.options.len(), 3);
        assert_eq!(fetched.options[1].votes, 7);

        db.remove_option(&story.id, &question.id, 0).await.unwrap();
        let fetched = db.get_question(&story.id, &question.id).await.unwrap().unwrap();
        assert_eq!(fetched.options[0].text, "b");

        assert!(db.remove_option(&story.id, &question.id, 9).await.is_err());
    }

    #[tokio::test]
    async fn voter_records_and_details_are_write_once() {
        let db = Database::open_in_memory().await;

        assert!(db.record_voter("s1", "u1").await.unwrap());
        assert!(!db.record_voter("s1", "u1").await.unwrap());
        assert!(db.voter_exists("s1", "u1").await.unwrap());
        assert!(!db.voter_exists("s1", "u2").await.unwrap());

        assert!(db.put_vote_detail("s1", "u1", "q1", 2).await.unwrap());
        assert!(!db.put_vote_detail("s1", "u1", "q1", 0).await.unwrap());

        let details = db.list_vote_details("s1", "u1").await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].question_id, "q1");
        assert_eq!(details[0].option_index, 2);
    }

    #[tokio::test]
    async fn generated_story_roundtrip() {
        let db = Database::open_in_memory().await;

        let story = GeneratedStory {
            generated_title: "T".to_string(),
            generated_story: vec!["p1".to_string(), "p2".to_string()],
            section_titles: vec!["A".to_string()],
        };
        db.save_generated_story("s1", &story).await.unwrap();

        let fetched = db.get_generated_story("s1").await.unwrap().unwrap();
        assert_eq!(fetched.generated_title, "T");
        assert_eq!(fetched.generated_story, vec!["p1", "p2"]);

        assert!(db.get_generated_story("s2").await.unwrap().is_none());
    }
}
